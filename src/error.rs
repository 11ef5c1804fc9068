//! Error types for reading and writing archives.

use std::io;

use thiserror::Error;

use crate::format::HeaderField;

/// Errors that can occur while reading or writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O error while reading the magic prefix.
    #[error("cannot read magic bytes: {0}")]
    ReadMagic(#[source] io::Error),

    /// The stream ended before the eight magic bytes.
    #[error("not an ar archive: truncated magic bytes")]
    TruncatedMagic,

    /// The stream does not start with `!<arch>\n`.
    #[error("not an ar archive: invalid magic bytes {found:?}")]
    BadMagic {
        /// The eight bytes found instead.
        found: [u8; 8],
    },

    /// I/O error while reading a header record.
    #[error("cannot read header: {0}")]
    ReadHeader(#[source] io::Error),

    /// The stream ended in the middle of a header record.
    #[error("truncated header record")]
    TruncatedHeader,

    /// The header record does not end with `` `\n ``.
    #[error("invalid header ending bytes {found:?}")]
    BadTerminator {
        /// The two bytes found instead.
        found: [u8; 2],
    },

    /// A header field could not be parsed.
    #[error("cannot parse {field}: {:?}", String::from_utf8_lossy(.value))]
    InvalidField {
        /// Which field failed.
        field: HeaderField,
        /// Raw field bytes.
        value: Vec<u8>,
    },

    /// The pad byte after an odd-sized payload is not `\n`.
    #[error("invalid padding byte {found:#04x}")]
    BadPadding {
        /// The byte found instead.
        found: u8,
    },

    /// Entry size exceeds the configured maximum.
    #[error("entry exceeds limit: {size} bytes > {limit} bytes")]
    EntryTooLarge {
        /// Size from the header.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// I/O error while skipping the rest of an entry.
    #[error("cannot skip unread entry data: {0}")]
    Skip(#[source] io::Error),

    /// I/O error while writing the magic prefix.
    #[error("cannot write magic bytes: {0}")]
    WriteMagic(#[source] io::Error),

    /// I/O error while writing a header record.
    #[error("cannot write header: {0}")]
    WriteHeader(#[source] io::Error),

    /// I/O error while writing entry data.
    #[error("cannot write entry data: {0}")]
    WritePayload(#[source] io::Error),

    /// I/O error while reading entry data from the caller's source.
    #[error("cannot read entry data from source: {0}")]
    Source(#[source] io::Error),

    /// A write would exceed the size declared in the header.
    #[error("write too long: {len} bytes > {remaining} bytes remaining")]
    WriteTooLong {
        /// Length of the rejected write.
        len: u64,
        /// Bytes left in the current entry.
        remaining: u64,
    },

    /// A header value does not fit its fixed-width field.
    #[error("{field} {value:?} does not fit in {width} bytes")]
    FieldTooLarge {
        /// Which field overflowed.
        field: HeaderField,
        /// Rendered value.
        value: String,
        /// Width of the field.
        width: usize,
    },

    /// A new header or the end of the archive was requested before the
    /// current entry was fully written.
    #[error("current entry is incomplete: {remaining} bytes not written")]
    IncompleteEntry {
        /// Bytes left in the current entry.
        remaining: u64,
    },

    /// An earlier write to the underlying stream failed.
    #[error("writer is unusable after a previous I/O error")]
    Poisoned,
}

impl ArchiveError {
    /// Whether this error means the input is not a well-formed archive.
    ///
    /// After such an error the stream position can no longer be trusted and
    /// the reader should be abandoned.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ArchiveError::BadMagic { .. }
                | ArchiveError::TruncatedMagic
                | ArchiveError::TruncatedHeader
                | ArchiveError::BadTerminator { .. }
                | ArchiveError::InvalidField { .. }
                | ArchiveError::BadPadding { .. }
                | ArchiveError::EntryTooLarge { .. }
        )
    }

    /// Recover an `ArchiveError` carried inside an [`io::Error`].
    ///
    /// The `std::io::Write` implementation of [`Writer`] reports contract
    /// violations such as [`ArchiveError::WriteTooLong`] this way.
    ///
    /// [`Writer`]: crate::Writer
    #[must_use]
    pub fn from_io(err: &io::Error) -> Option<&ArchiveError> {
        err.get_ref()?.downcast_ref::<ArchiveError>()
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            ArchiveError::WritePayload(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
