//! Sequential archive reader.

use std::io::{self, ErrorKind, Read};

use log::{debug, trace};

use crate::format::RawHeader;
use crate::util::{read_exactish, skip_exact};
use crate::{ArchiveError, Header, ReaderOptions, Result, HEADER_SIZE, MAGIC, PAD_BYTE};

/// Sequential reader for an `ar` archive.
///
/// [`next_entry`] advances to the next member (including the first) and
/// returns its header; the reader then acts as a [`Read`] over that member's
/// payload, returning `Ok(0)` once `header.size` bytes have been read.
///
/// Payload that is not read is skipped by the following `next_entry` call,
/// so callers only read the members they care about.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::{BufReader, Read};
/// use ar_stream::Reader;
///
/// let file = File::open("package.deb").unwrap();
/// let mut reader = Reader::new(BufReader::new(file)).unwrap();
///
/// while let Some(header) = reader.next_entry().unwrap() {
///     if header.name == b"debian-binary" {
///         let mut version = String::new();
///         reader.read_to_string(&mut version).unwrap();
///         println!("format {}", version.trim());
///     }
/// }
/// ```
///
/// [`next_entry`]: Reader::next_entry
#[derive(Debug)]
pub struct Reader<R> {
    reader: R,
    options: ReaderOptions,
    /// Payload bytes left in the current entry.
    remaining: u64,
    /// Pad byte still to be consumed after the payload (0 or 1).
    pad: u64,
    /// Bytes consumed from the stream so far.
    pos: u64,
}

impl<R: Read> Reader<R> {
    /// Create a reader with default options.
    ///
    /// Reads and checks the magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::TruncatedMagic`] if the stream ends before
    /// eight bytes, [`ArchiveError::ReadMagic`] on any other I/O error and
    /// [`ArchiveError::BadMagic`] if they are not `!<arch>\n`.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, ReaderOptions::default())
    }

    /// Create a reader with the given options.
    ///
    /// # Errors
    ///
    /// See [`Reader::new`].
    pub fn with_options(mut reader: R, options: ReaderOptions) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ArchiveError::TruncatedMagic,
            _ => ArchiveError::ReadMagic(e),
        })?;
        if magic != *MAGIC {
            return Err(ArchiveError::BadMagic { found: magic });
        }
        trace!("ar magic accepted");

        Ok(Self {
            reader,
            options,
            remaining: 0,
            pad: 0,
            pos: MAGIC.len() as u64,
        })
    }

    /// Advance to the next entry.
    ///
    /// Any unread payload of the current entry, and its pad byte, is
    /// discarded first. Returns `Ok(None)` when the stream ends cleanly at
    /// an entry boundary.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Skip`] if the rest of the current entry cannot be
    ///   discarded
    /// - [`ArchiveError::TruncatedHeader`] if the stream ends inside a header
    /// - [`ArchiveError::ReadHeader`] for other read failures
    /// - [`ArchiveError::BadTerminator`], [`ArchiveError::InvalidField`],
    ///   [`ArchiveError::BadPadding`] or [`ArchiveError::EntryTooLarge`] for
    ///   malformed input
    pub fn next_entry(&mut self) -> Result<Option<Header>> {
        self.skip_unread()?;

        let mut buf = [0u8; HEADER_SIZE];
        match read_exactish(&mut self.reader, &mut buf) {
            Ok(true) => {}
            Ok(false) => {
                debug!("end of archive at offset {}", self.pos);
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(ArchiveError::TruncatedHeader)
            }
            Err(e) => return Err(ArchiveError::ReadHeader(e)),
        }
        let offset = self.pos;
        self.pos += HEADER_SIZE as u64;

        let raw = RawHeader::from_bytes_exact(&buf);
        raw.verify_terminator()?;
        let header = Header::from_raw(raw)?;

        if header.size > self.options.max_entry_size {
            return Err(ArchiveError::EntryTooLarge {
                size: header.size,
                limit: self.options.max_entry_size,
            });
        }

        debug!(
            "entry {:?} ({} bytes) at offset {offset}",
            header.name_lossy(),
            header.size
        );
        self.remaining = header.size;
        self.pad = header.size % 2;

        Ok(Some(header))
    }

    /// Get the number of payload bytes left in the current entry.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Get the number of bytes consumed from the underlying stream.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Get the options this reader was created with.
    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader.
    ///
    /// Reading from it directly desynchronizes the archive position.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn skip_unread(&mut self) -> Result<()> {
        if self.remaining > 0 {
            trace!("discarding {} unread bytes", self.remaining);
            skip_exact(&mut self.reader, self.remaining).map_err(ArchiveError::Skip)?;
            self.pos += self.remaining;
            self.remaining = 0;
        }

        if self.pad > 0 {
            if self.options.verify_padding {
                let mut byte = [0u8; 1];
                self.reader
                    .read_exact(&mut byte)
                    .map_err(ArchiveError::Skip)?;
                if byte[0] != PAD_BYTE {
                    return Err(ArchiveError::BadPadding { found: byte[0] });
                }
            } else {
                skip_exact(&mut self.reader, self.pad).map_err(ArchiveError::Skip)?;
            }
            trace!("skipped pad byte at offset {}", self.pos);
            self.pos += self.pad;
            self.pad = 0;
        }

        Ok(())
    }
}

impl<R: Read> Read for Reader<R> {
    /// Read payload of the current entry.
    ///
    /// Never reads past the end of the entry; returns `Ok(0)` once it is
    /// exhausted. Short reads from the underlying stream are passed through,
    /// but a stream that ends inside the payload is an `UnexpectedEof` error.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let limit = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        let len = buf.len().min(limit);
        let n = self.reader.read(&mut buf[..len])?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("archive ended with {} bytes of entry data missing", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        self.pos += n as u64;

        Ok(n)
    }
}
