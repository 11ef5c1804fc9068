//! Sequential reader and writer for Unix `ar` archives.
//!
//! This crate handles the minimal common subset of the `ar` container format,
//! the one used by Debian `.deb` packages: a magic prefix followed by a
//! sequence of members, each made of a fixed 60-byte header record and the
//! member's payload.
//!
//! # Wire Format
//!
//! | Offset | Size | Field      | Encoding                          |
//! |--------|------|------------|-----------------------------------|
//! | 0      | 16   | name       | text, space padded                |
//! | 16     | 12   | date       | decimal seconds since the epoch   |
//! | 28     | 6    | uid        | decimal                           |
//! | 34     | 6    | gid        | decimal                           |
//! | 40     | 8    | mode       | octal                             |
//! | 48     | 10   | size       | decimal payload length            |
//! | 58     | 2    | terminator | literal `` `\n ``                 |
//!
//! Every field is left-justified and right-padded with ASCII spaces. The
//! payload follows the header; when its size is odd a single `\n` pad byte
//! keeps the next header on an even offset.
//!
//! # Reading
//!
//! ```
//! use std::io::{Cursor, Read};
//! use ar_stream::Reader;
//!
//! let data = b"!<arch>\ndebian-binary   0           0     0     100644  4         `\n2.0\n";
//! let mut reader = Reader::new(Cursor::new(&data[..])).unwrap();
//!
//! while let Some(header) = reader.next_entry().unwrap() {
//!     let mut content = Vec::new();
//!     reader.read_to_end(&mut content).unwrap();
//!     println!("{} ({} bytes)", header.name_lossy(), content.len());
//! }
//! ```
//!
//! # Writing
//!
//! ```
//! use ar_stream::{Header, Writer};
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_magic_bytes().unwrap();
//! writer.append_data(&Header::new("debian-binary", 4), b"2.0\n").unwrap();
//! let archive = writer.finish().unwrap();
//! assert_eq!(archive.len(), 8 + 60 + 4);
//! ```
//!
//! Neither side closes or buffers the underlying stream; wrap it in a
//! `BufReader`/`BufWriter` if needed.

mod config;
mod error;
pub mod format;
mod header;
mod reader;
mod util;
mod writer;

pub use config::{ReaderOptions, SizeCheck, WriterOptions};
pub use error::{ArchiveError, Result};
pub use format::HeaderField;
pub use header::Header;
pub use reader::Reader;
pub use writer::Writer;

/// Magic bytes at the start of every archive.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";

/// Size of a member header record in bytes.
pub const HEADER_SIZE: usize = 60;

/// The two bytes closing every header record.
pub const TERMINATOR: &[u8; 2] = b"`\n";

/// Alignment byte written after odd-sized payloads.
pub const PAD_BYTE: u8 = b'\n';
