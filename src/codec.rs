//! Binary codec
//!
//! Serialization primitives shared by the archive format: fixed-width
//! integers, NUL-terminated names, and bounded stream copies.
//!
//! ## Conventions
//!
//! - Multi-byte integers are always big-endian on disk, regardless of
//!   host byte order. Single-byte values are copied verbatim.
//! - Names are raw bytes followed by a single zero byte. A zero byte
//!   never occurs inside a valid name.
//! - Bulk copies transfer up to a byte limit (or until the source is
//!   exhausted) and report how many bytes actually moved.

use std::io::{Read, Write};

use crate::error::{PackError, Result};

// =============================================================================
// Integer Encoding/Decoding
// =============================================================================

/// Write a single byte
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

/// Write a u16 in big-endian order
pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a u32 in big-endian order
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write an i32 in big-endian order
pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a u64 in big-endian order
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Read a single byte
pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a big-endian u16
pub fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a big-endian u32
pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a big-endian i32
pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Read a big-endian u64
pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

// =============================================================================
// Name Encoding/Decoding
// =============================================================================

/// Write a name as raw bytes plus a zero terminator
///
/// The caller guarantees the name contains no NUL byte (enforced at
/// entry creation).
pub fn write_name<W: Write>(writer: &mut W, name: &str) -> Result<()> {
    writer.write_all(name.as_bytes())?;
    writer.write_all(&[0])?;
    Ok(())
}

/// Read a zero-terminated name
///
/// Consumes bytes up to and including the terminator. Fails with
/// `Corruption` if the bytes are not valid UTF-8.
pub fn read_name<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let b = read_u8(reader)?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }

    String::from_utf8(bytes)
        .map_err(|_| PackError::Corruption("entry name is not valid UTF-8".to_string()))
}

// =============================================================================
// Bulk Copy
// =============================================================================

/// Copy up to `limit` bytes from `reader` to `writer`
///
/// Transfers in `chunk`-sized reads and stops early if the source is
/// exhausted. Returns the number of bytes actually copied.
pub fn copy_limited<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    limit: u64,
    chunk: usize,
) -> Result<u64> {
    let mut buf = vec![0u8; chunk.max(1)];
    let mut copied: u64 = 0;

    while copied < limit {
        let want = buf.len().min((limit - copied) as usize);
        let n = reader.read(&mut buf[..want])?;
        if n == 0 {
            break; // Source exhausted
        }
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }

    Ok(copied)
}
