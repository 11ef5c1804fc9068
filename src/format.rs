//! On-disk layout of the `ar` member header and its field codecs.
//!
//! The header is a 60-byte record of fixed-width ASCII fields. [`RawHeader`]
//! maps that record with zerocopy so both directions work on named fields
//! instead of offsets; the helpers below trim, parse and render a single
//! field.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{ArchiveError, Result, HEADER_SIZE, TERMINATOR};

/// Raw 60-byte member header.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawHeader {
    /// Member name, space padded.
    pub name: [u8; 16],
    /// Modification time as decimal seconds since the epoch.
    pub date: [u8; 12],
    /// Owner user ID in decimal.
    pub uid: [u8; 6],
    /// Owner group ID in decimal.
    pub gid: [u8; 6],
    /// File mode in octal.
    pub mode: [u8; 8],
    /// Payload size in decimal.
    pub size: [u8; 10],
    /// Always `` `\n ``.
    pub terminator: [u8; 2],
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            name: [b' '; 16],
            date: [b' '; 12],
            uid: [b' '; 6],
            gid: [b' '; 6],
            mode: [b' '; 8],
            size: [b' '; 10],
            terminator: *TERMINATOR,
        }
    }
}

impl RawHeader {
    /// View a 60-byte buffer as a header record.
    #[must_use]
    pub fn from_bytes_exact(bytes: &[u8; HEADER_SIZE]) -> &RawHeader {
        zerocopy::transmute_ref!(bytes)
    }

    /// Check the terminator bytes.
    ///
    /// Both bytes must match.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::BadTerminator`] otherwise.
    pub fn verify_terminator(&self) -> Result<()> {
        if self.terminator == *TERMINATOR {
            Ok(())
        } else {
            Err(ArchiveError::BadTerminator {
                found: self.terminator,
            })
        }
    }
}

impl fmt::Debug for RawHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHeader")
            .field("name", &String::from_utf8_lossy(trim_padding(&self.name)))
            .field("date", &String::from_utf8_lossy(trim_padding(&self.date)))
            .field("mode", &String::from_utf8_lossy(trim_padding(&self.mode)))
            .field("size", &String::from_utf8_lossy(trim_padding(&self.size)))
            .field("terminator", &self.terminator)
            .finish_non_exhaustive()
    }
}

/// Identifies a header field, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// Member name.
    Name,
    /// Modification time.
    Date,
    /// Owner user ID.
    Uid,
    /// Owner group ID.
    Gid,
    /// File mode.
    Mode,
    /// Payload size.
    Size,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeaderField::Name => "name",
            HeaderField::Date => "timestamp",
            HeaderField::Uid => "owner id",
            HeaderField::Gid => "group id",
            HeaderField::Mode => "mode",
            HeaderField::Size => "size",
        })
    }
}

/// Strip the trailing space padding from a field.
///
/// The first byte is always kept, so a field of all spaces trims to a
/// single space rather than to nothing.
///
/// ```
/// use ar_stream::format::trim_padding;
///
/// assert_eq!(trim_padding(b"hello   "), b"hello");
/// assert_eq!(trim_padding(b"a b  "), b"a b");
/// assert_eq!(trim_padding(b"    "), b" ");
/// ```
#[must_use]
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 1 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    &bytes[..end]
}

/// Name bytes with their padding removed.
///
/// Unlike numeric fields, a name made only of spaces is empty.
#[must_use]
pub fn parse_name(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|&b| b != b' ') {
        Some(last) => &bytes[..=last],
        None => &[],
    }
}

fn invalid(field: HeaderField, bytes: &[u8]) -> ArchiveError {
    ArchiveError::InvalidField {
        field,
        value: bytes.to_vec(),
    }
}

/// Parse a space-padded signed decimal field.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidField`] naming `field` if the trimmed
/// content is not a number.
pub fn parse_signed(field: HeaderField, bytes: &[u8]) -> Result<i64> {
    let trimmed = trim_padding(bytes);
    let text = std::str::from_utf8(trimmed).map_err(|_| invalid(field, bytes))?;
    text.parse::<i64>().map_err(|_| invalid(field, bytes))
}

/// Parse a space-padded unsigned field in the given radix.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidField`] naming `field` if the trimmed
/// content is not a number in `radix`, or is negative.
pub fn parse_unsigned(field: HeaderField, bytes: &[u8], radix: u32) -> Result<u64> {
    let trimmed = trim_padding(bytes);
    let text = std::str::from_utf8(trimmed).map_err(|_| invalid(field, bytes))?;
    u64::from_str_radix(text, radix).map_err(|_| invalid(field, bytes))
}

/// Copy `value` into `slot`, left-justified and padded with spaces.
///
/// # Errors
///
/// Returns [`ArchiveError::FieldTooLarge`] if `value` does not fit.
pub fn write_padded(field: HeaderField, slot: &mut [u8], value: &[u8]) -> Result<()> {
    if value.len() > slot.len() {
        return Err(ArchiveError::FieldTooLarge {
            field,
            value: String::from_utf8_lossy(value).into_owned(),
            width: slot.len(),
        });
    }
    let (head, tail) = slot.split_at_mut(value.len());
    head.copy_from_slice(value);
    tail.fill(b' ');
    Ok(())
}

/// Render `value` in decimal into `slot`.
///
/// # Errors
///
/// Returns [`ArchiveError::FieldTooLarge`] if the digits do not fit.
pub fn write_decimal(field: HeaderField, slot: &mut [u8], value: u64) -> Result<()> {
    write_padded(field, slot, value.to_string().as_bytes())
}

/// Render `value` in octal into `slot`.
///
/// # Errors
///
/// Returns [`ArchiveError::FieldTooLarge`] if the digits do not fit.
pub fn write_octal(field: HeaderField, slot: &mut [u8], value: u64) -> Result<()> {
    write_padded(field, slot, format!("{value:o}").as_bytes())
}
