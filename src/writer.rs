//! Sequential archive writer.

use std::io::{self, ErrorKind, Read, Write};

use log::{debug, trace};
use zerocopy::IntoBytes;

use crate::{ArchiveError, Header, Result, SizeCheck, WriterOptions, MAGIC, PAD_BYTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No header written yet.
    Fresh,
    /// A header was written; `written` counts payload bytes accepted since.
    EntryOpen { size: u64, written: u64 },
    /// The sink failed; nothing more can be written.
    Poisoned,
}

/// Sequential writer for an `ar` archive.
///
/// Call [`write_magic_bytes`] once, then for each member call
/// [`write_header`] followed by exactly `header.size` bytes of payload
/// through [`Write`]. The pad byte after odd-sized payloads is added
/// automatically.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use ar_stream::{Header, Writer};
///
/// let mut writer = Writer::new(Vec::new());
/// writer.write_magic_bytes().unwrap();
/// writer.write_header(&Header::new("control.tar", 5)).unwrap();
/// writer.write_all(b"AAA").unwrap();
/// writer.write_all(b"AA").unwrap();
/// let archive = writer.finish().unwrap();
///
/// // Odd payload, so one pad byte follows it.
/// assert_eq!(archive.len(), 8 + 60 + 5 + 1);
/// assert_eq!(archive.last(), Some(&b'\n'));
/// ```
///
/// [`write_magic_bytes`]: Writer::write_magic_bytes
/// [`write_header`]: Writer::write_header
#[derive(Debug)]
pub struct Writer<W> {
    writer: W,
    options: WriterOptions,
    state: State,
}

impl<W: Write> Writer<W> {
    /// Create a writer with default options. Nothing is written yet.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, WriterOptions::default())
    }

    /// Create a writer with the given options.
    pub fn with_options(writer: W, options: WriterOptions) -> Self {
        Self {
            writer,
            options,
            state: State::Fresh,
        }
    }

    /// Write the archive magic bytes.
    ///
    /// Must be called exactly once, before the first header. This is not
    /// checked.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::WriteMagic`] if the sink fails.
    pub fn write_magic_bytes(&mut self) -> Result<()> {
        self.check_usable()?;
        self.writer.write_all(MAGIC).map_err(|e| {
            self.state = State::Poisoned;
            ArchiveError::WriteMagic(e)
        })?;
        trace!("wrote ar magic");
        Ok(())
    }

    /// Write a member header and open the member for payload.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::IncompleteEntry`] if the previous member still has
    ///   payload to be written (unless disabled in [`WriterOptions`])
    /// - [`ArchiveError::FieldTooLarge`] if a header value does not fit its
    ///   field; nothing is written in that case
    /// - [`ArchiveError::WriteHeader`] if the sink fails
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        self.check_usable()?;
        self.check_complete()?;

        let raw = header.to_raw()?;
        self.writer.write_all(raw.as_bytes()).map_err(|e| {
            self.state = State::Poisoned;
            ArchiveError::WriteHeader(e)
        })?;

        debug!("entry {:?} ({} bytes)", header.name_lossy(), header.size);
        self.state = State::EntryOpen {
            size: header.size,
            written: 0,
        };
        Ok(())
    }

    /// Write payload for the current member.
    ///
    /// The whole buffer is written or nothing is. When this write completes
    /// a member of odd size the pad byte is written after it; it is not
    /// included in the returned count.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::WriteTooLong`] if `buf` does not fit in the current
    ///   member; nothing is written and the member is unchanged
    /// - [`ArchiveError::WritePayload`] if the sink fails
    pub fn write_payload(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_usable()?;

        let (size, written) = match self.state {
            State::EntryOpen { size, written } => (size, written),
            _ => (0, 0),
        };
        let len = buf.len() as u64;
        let allowed = match self.options.size_check {
            SizeCheck::RunningTotal => size.saturating_sub(written),
            SizeCheck::PerCall => size,
        };
        if len > allowed {
            return Err(ArchiveError::WriteTooLong {
                len,
                remaining: size.saturating_sub(written),
            });
        }
        if len == 0 {
            return Ok(0);
        }

        let total = written + len;
        let completes = written < size && total >= size;

        // The pad goes out in the same call as the final payload bytes.
        let result = if completes && total % 2 == 1 {
            trace!("writing pad byte");
            let mut padded = Vec::with_capacity(buf.len() + 1);
            padded.extend_from_slice(buf);
            padded.push(PAD_BYTE);
            self.writer.write_all(&padded)
        } else {
            self.writer.write_all(buf)
        };
        if let Err(e) = result {
            self.state = State::Poisoned;
            return Err(ArchiveError::WritePayload(e));
        }

        self.state = State::EntryOpen {
            size,
            written: total,
        };
        Ok(buf.len())
    }

    /// Write a header followed by its complete payload.
    ///
    /// # Errors
    ///
    /// Fails with [`ArchiveError::WriteTooLong`] or
    /// [`ArchiveError::IncompleteEntry`] before writing anything if
    /// `data.len()` differs from `header.size`; otherwise as
    /// [`write_header`](Writer::write_header) and
    /// [`write_payload`](Writer::write_payload).
    pub fn append_data(&mut self, header: &Header, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        if len > header.size {
            return Err(ArchiveError::WriteTooLong {
                len,
                remaining: header.size,
            });
        }
        if len < header.size {
            return Err(ArchiveError::IncompleteEntry {
                remaining: header.size - len,
            });
        }

        self.write_header(header)?;
        self.write_payload(data)?;
        Ok(())
    }

    /// Write a header followed by `header.size` bytes copied from `data`.
    ///
    /// Bytes in `data` beyond `header.size` are left unread.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Source`] if reading `data` fails
    /// - [`ArchiveError::IncompleteEntry`] if `data` ends early; the archive
    ///   is left with a truncated member
    /// - otherwise as [`write_header`](Writer::write_header) and
    ///   [`write_payload`](Writer::write_payload)
    pub fn append(&mut self, header: &Header, data: &mut impl Read) -> Result<()> {
        self.write_header(header)?;

        let mut buf = [0u8; 8192];
        let mut remaining = header.size;
        while remaining > 0 {
            let want = std::cmp::min(remaining, buf.len() as u64) as usize;
            let n = match data.read(&mut buf[..want]) {
                Ok(0) => return Err(ArchiveError::IncompleteEntry { remaining }),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ArchiveError::Source(e)),
            };
            self.write_payload(&buf[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Get the number of payload bytes still expected for the current member.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        match self.state {
            State::EntryOpen { size, written } => size.saturating_sub(written),
            _ => 0,
        }
    }

    /// Get the options this writer was created with.
    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Check that the last member is complete, flush, and return the
    /// underlying writer.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Poisoned`] after an earlier sink failure
    /// - [`ArchiveError::IncompleteEntry`] if the last member is short
    ///   (unless disabled in [`WriterOptions`])
    /// - [`ArchiveError::WritePayload`] if flushing fails
    pub fn finish(mut self) -> Result<W> {
        self.check_usable()?;
        self.check_complete()?;
        self.writer.flush().map_err(ArchiveError::WritePayload)?;
        Ok(self.writer)
    }

    fn check_usable(&self) -> Result<()> {
        match self.state {
            State::Poisoned => Err(ArchiveError::Poisoned),
            _ => Ok(()),
        }
    }

    fn check_complete(&self) -> Result<()> {
        let remaining = self.remaining();
        if self.options.require_complete_entries && remaining > 0 {
            return Err(ArchiveError::IncompleteEntry { remaining });
        }
        Ok(())
    }
}

impl<W: Write> Write for Writer<W> {
    /// Same as [`Writer::write_payload`].
    ///
    /// Contract violations are reported as `InvalidInput` errors carrying
    /// the [`ArchiveError`]; see [`ArchiveError::from_io`].
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_payload(buf).map_err(ArchiveError::into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HEADER_SIZE;

    /// Sink that fails every write after the first `budget` bytes.
    struct FailingSink {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.data.len() + buf.len() > self.budget {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink that records each `write` call separately.
    #[derive(Default)]
    struct CallLog {
        calls: Vec<Vec<u8>>,
    }

    impl Write for CallLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn started() -> Writer<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_magic_bytes().unwrap();
        writer
    }

    #[test]
    fn test_new_writes_nothing() {
        let writer = Writer::new(Vec::new());
        assert!(writer.get_ref().is_empty());
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_header_layout() {
        let mut writer = started();
        let header = Header {
            date: 1_650_000_000,
            uid: 1000,
            gid: 100,
            ..Header::new("debian-binary", 4)
        };
        writer.write_header(&header).unwrap();
        writer.write_all(b"2.0\n").unwrap();
        let data = writer.finish().unwrap();

        assert_eq!(&data[..8], b"!<arch>\n");
        assert_eq!(
            &data[8..68],
            b"debian-binary   1650000000  1000  100   100644  4         `\n"
        );
        assert_eq!(&data[68..], b"2.0\n");
    }

    #[test]
    fn test_pad_after_odd_payload() {
        let mut writer = started();
        writer.write_header(&Header::new("a", 3)).unwrap();
        assert_eq!(writer.write(b"ab").unwrap(), 2);
        assert_eq!(writer.get_ref().len(), 8 + 60 + 2);
        assert_eq!(writer.write(b"c").unwrap(), 1);
        let data = writer.finish().unwrap();
        assert_eq!(&data[68..], b"abc\n");
    }

    #[test]
    fn test_no_pad_for_odd_chunks_of_even_entry() {
        let mut writer = started();
        writer.write_header(&Header::new("a", 4)).unwrap();
        writer.write_all(b"a").unwrap();
        writer.write_all(b"bcd").unwrap();
        let data = writer.finish().unwrap();
        assert_eq!(&data[68..], b"abcd");
    }

    #[test]
    fn test_write_too_long() {
        let mut writer = started();
        writer.write_header(&Header::new("a", 4)).unwrap();
        writer.write_all(b"ab").unwrap();

        let err = writer.write_payload(b"cde").unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::WriteTooLong {
                len: 3,
                remaining: 2
            }
        ));
        assert_eq!(writer.remaining(), 2);
        assert_eq!(writer.get_ref().len(), 8 + 60 + 2);

        let err = writer.write(b"cde").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(matches!(
            ArchiveError::from_io(&err),
            Some(ArchiveError::WriteTooLong { .. })
        ));

        writer.write_all(b"cd").unwrap();
        assert_eq!(writer.remaining(), 0);
    }

    #[test]
    fn test_write_before_header() {
        let mut writer = started();
        assert!(matches!(
            writer.write_payload(b"x"),
            Err(ArchiveError::WriteTooLong {
                len: 1,
                remaining: 0
            })
        ));
        assert_eq!(writer.write_payload(b"").unwrap(), 0);
    }

    #[test]
    fn test_per_call_check() {
        let mut writer = Writer::with_options(Vec::new(), WriterOptions::permissive());
        writer.write_magic_bytes().unwrap();
        writer.write_header(&Header::new("a", 2)).unwrap();
        writer.write_all(b"ab").unwrap();
        // Each call fits on its own, so the overflow is not caught.
        writer.write_all(b"cd").unwrap();
        assert!(writer.write_payload(b"xyz").is_err());
        assert_eq!(&writer.get_ref()[68..], b"abcd");
    }

    #[test]
    fn test_incomplete_entry() {
        let mut writer = started();
        writer.write_header(&Header::new("a", 4)).unwrap();
        writer.write_all(b"ab").unwrap();

        assert!(matches!(
            writer.write_header(&Header::new("b", 0)),
            Err(ArchiveError::IncompleteEntry { remaining: 2 })
        ));
        assert!(matches!(
            writer.finish(),
            Err(ArchiveError::IncompleteEntry { remaining: 2 })
        ));
    }

    #[test]
    fn test_incomplete_entry_allowed_when_permissive() {
        let mut writer = Writer::with_options(Vec::new(), WriterOptions::permissive());
        writer.write_magic_bytes().unwrap();
        writer.write_header(&Header::new("a", 4)).unwrap();
        writer.write_header(&Header::new("b", 0)).unwrap();
        assert_eq!(writer.finish().unwrap().len(), 8 + 60 + 60);
    }

    #[test]
    fn test_field_too_large_writes_nothing() {
        let mut writer = started();
        let header = Header {
            gid: 10_000_000,
            ..Header::new("a", 0)
        };
        assert!(matches!(
            writer.write_header(&header),
            Err(ArchiveError::FieldTooLarge { .. })
        ));
        assert_eq!(writer.get_ref().len(), 8);
        writer.write_header(&Header::new("a", 0)).unwrap();
    }

    #[test]
    fn test_append_data() {
        let mut writer = started();
        writer
            .append_data(&Header::new("a", 3), b"abc")
            .unwrap();
        assert!(matches!(
            writer.append_data(&Header::new("b", 3), b"ab"),
            Err(ArchiveError::IncompleteEntry { remaining: 1 })
        ));
        assert!(matches!(
            writer.append_data(&Header::new("b", 1), b"ab"),
            Err(ArchiveError::WriteTooLong { .. })
        ));
        let data = writer.finish().unwrap();
        assert_eq!(data.len(), 8 + 60 + 4);
    }

    #[test]
    fn test_append_reader() {
        let mut writer = started();
        let mut source: &[u8] = b"hello world";
        writer.append(&Header::new("a", 5), &mut source).unwrap();
        assert_eq!(source, b" world");

        let mut short: &[u8] = b"ab";
        assert!(matches!(
            writer.append(&Header::new("b", 4), &mut short),
            Err(ArchiveError::IncompleteEntry { remaining: 2 })
        ));
    }

    #[test]
    fn test_sink_failure_poisons() {
        let sink = FailingSink {
            data: Vec::new(),
            budget: 8 + 60 + 2,
        };
        let mut writer = Writer::new(sink);
        writer.write_magic_bytes().unwrap();
        writer.write_header(&Header::new("a", 4)).unwrap();
        writer.write_all(b"ab").unwrap();

        assert!(matches!(
            writer.write_payload(b"cd"),
            Err(ArchiveError::WritePayload(ref e)) if e.kind() == io::ErrorKind::BrokenPipe
        ));
        assert!(matches!(
            writer.write_header(&Header::new("b", 0)),
            Err(ArchiveError::Poisoned)
        ));
        assert!(matches!(writer.finish(), Err(ArchiveError::Poisoned)));
    }

    #[test]
    fn test_pad_shares_final_write() {
        let mut writer = Writer::new(CallLog::default());
        writer.write_header(&Header::new("odd", 3)).unwrap();
        writer.write_payload(b"ab").unwrap();
        writer.write_payload(b"c").unwrap();
        writer.write_header(&Header::new("even", 2)).unwrap();
        writer.write_payload(b"de").unwrap();
        let log = writer.finish().unwrap();

        assert_eq!(log.calls.len(), 5);
        assert_eq!(log.calls[1], b"ab");
        assert_eq!(log.calls[2], b"c\n");
        assert_eq!(log.calls[4], b"de");
    }

    #[test]
    fn test_failed_padded_write_poisons() {
        // Room for the header and the payload byte, not the pad.
        let mut writer = Writer::new(FailingSink {
            data: Vec::new(),
            budget: HEADER_SIZE + 1,
        });
        writer.write_header(&Header::new("odd", 1)).unwrap();
        assert!(matches!(
            writer.write_payload(b"x"),
            Err(ArchiveError::WritePayload(_))
        ));
        assert_eq!(writer.get_ref().data.len(), HEADER_SIZE);
        assert!(matches!(writer.write_payload(b"x"), Err(ArchiveError::Poisoned)));
    }
}
