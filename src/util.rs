//! Stream helpers shared by the reader.

use std::io::{self, Error, ErrorKind, Read, Result};

/// Fill `buf` from `reader`, telling a clean end of stream from a short one.
///
/// Returns `Ok(true)` once `buf` is full and `Ok(false)` if the stream was
/// already exhausted before the first byte. A stream that ends part way
/// through `buf` yields `ErrorKind::UnexpectedEof`. Interrupted reads are
/// retried; other errors are passed through.
pub(crate) fn read_exactish(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(Error::from(ErrorKind::UnexpectedEof)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Read and discard exactly `len` bytes.
///
/// Fails with ErrorKind::UnexpectedEof if the stream ends first.
pub(crate) fn skip_exact(reader: &mut impl Read, len: u64) -> Result<()> {
    let copied = io::copy(&mut reader.take(len), &mut io::sink())?;
    if copied < len {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream ended {} bytes early", len - copied),
        ));
    }
    Ok(())
}
