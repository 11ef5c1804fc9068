//! Decoded member header.

use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::format::{
    parse_name, parse_signed, parse_unsigned, write_decimal, write_octal, write_padded,
    HeaderField, RawHeader,
};
use crate::Result;

/// Metadata of one archive member.
///
/// Returned by [`Reader::next_entry`] and consumed by
/// [`Writer::write_header`]. Trailing spaces in `name` cannot be told apart
/// from field padding and are lost on a round trip.
///
/// [`Reader::next_entry`]: crate::Reader::next_entry
/// [`Writer::write_header`]: crate::Writer::write_header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Member name, at most 16 bytes.
    pub name: Vec<u8>,

    /// Modification time in seconds since the Unix epoch.
    pub date: i64,

    /// Owner user ID.
    pub uid: u64,

    /// Owner group ID.
    pub gid: u64,

    /// File mode and permission bits.
    pub mode: u32,

    /// Payload length in bytes, excluding the pad byte.
    pub size: u64,
}

impl Header {
    /// Create a header for a regular `0644` file owned by root with a zero
    /// timestamp.
    pub fn new(name: impl Into<Vec<u8>>, size: u64) -> Self {
        Self {
            name: name.into(),
            date: 0,
            uid: 0,
            gid: 0,
            mode: 0o100644,
            size,
        }
    }

    /// Get the name as a lossy UTF-8 string.
    #[must_use]
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Get the modification time.
    ///
    /// Returns `None` if `date` is outside the range of [`SystemTime`].
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        let offset = Duration::from_secs(self.date.unsigned_abs());
        if self.date >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }

    /// Get the number of bytes following the header on the wire, pad
    /// byte included.
    #[must_use]
    pub fn padded_size(&self) -> u64 {
        self.size.saturating_add(self.size % 2)
    }

    /// Decode a raw header record.
    ///
    /// The terminator is not checked here; see
    /// [`RawHeader::verify_terminator`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidField`](crate::ArchiveError::InvalidField) naming the first numeric field
    /// that fails to parse.
    pub fn from_raw(raw: &RawHeader) -> Result<Self> {
        let date = parse_signed(HeaderField::Date, &raw.date)?;
        let uid = parse_unsigned(HeaderField::Uid, &raw.uid, 10)?;
        let gid = parse_unsigned(HeaderField::Gid, &raw.gid, 10)?;
        let mode = parse_unsigned(HeaderField::Mode, &raw.mode, 8)?;
        let size = parse_unsigned(HeaderField::Size, &raw.size, 10)?;

        Ok(Self {
            name: parse_name(&raw.name).to_vec(),
            date,
            uid,
            gid,
            // At most eight octal digits, so it always fits.
            mode: mode as u32,
            size,
        })
    }

    /// Encode into a raw header record.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::FieldTooLarge`](crate::ArchiveError::FieldTooLarge)
    /// if any value does not fit its field.
    pub fn to_raw(&self) -> Result<RawHeader> {
        let mut raw = RawHeader::default();

        write_padded(HeaderField::Name, &mut raw.name, &self.name)?;
        write_padded(
            HeaderField::Date,
            &mut raw.date,
            self.date.to_string().as_bytes(),
        )?;
        write_decimal(HeaderField::Uid, &mut raw.uid, self.uid)?;
        write_decimal(HeaderField::Gid, &mut raw.gid, self.gid)?;
        write_octal(HeaderField::Mode, &mut raw.mode, u64::from(self.mode))?;
        write_decimal(HeaderField::Size, &mut raw.size, self.size)?;

        Ok(raw)
    }
}
