use std::fmt;
use std::ops::Deref;

use tracing::trace;

use crate::error::{CompactError, CompactResult};

/// Maximum number of bytes a compact number occupies on the wire.
pub const MAX_COMPACT_BYTES: usize = 4;

/// Largest value representable as a compact number (28 payload bits).
pub const MAX_COMPACT_VALUE: i32 = (1 << (7 * MAX_COMPACT_BYTES)) - 1;

/// Continuation flag: set on every byte except the last.
pub const CONTINUATION_FLAG: u8 = 0x80;

const PAYLOAD_MASK: u8 = 0x7F;
const PAYLOAD_BITS: usize = 7;

/// An encoded compact number, stored inline.
///
/// Dereferences to the exact wire bytes (1 to 4 of them).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactBytes {
    buf: [u8; MAX_COMPACT_BYTES],
    len: u8,
}

impl CompactBytes {
    /// The encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for CompactBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for CompactBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for CompactBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompactBytes").field(&self.as_slice()).finish()
    }
}

/// Number of bytes `compact(value)` produces.
pub fn encoded_len(value: i32) -> CompactResult<usize> {
    if !(0..=MAX_COMPACT_VALUE).contains(&value) {
        return Err(CompactError::OutOfRange(value));
    }
    let len = match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    };
    Ok(len)
}

/// Encode `value` in its minimal compact form.
///
/// Payload is packed seven bits per byte, least significant group first.
pub fn compact(value: i32) -> CompactResult<CompactBytes> {
    let len = encoded_len(value)?;
    let mut buf = [0u8; MAX_COMPACT_BYTES];
    let mut rest = value as u32;
    for (i, slot) in buf.iter_mut().take(len).enumerate() {
        let mut byte = (rest as u8) & PAYLOAD_MASK;
        rest >>= PAYLOAD_BITS;
        if i + 1 < len {
            byte |= CONTINUATION_FLAG;
        }
        *slot = byte;
    }
    Ok(CompactBytes {
        buf,
        len: len as u8,
    })
}

/// Append the compact form of `value` to `buf`.
pub fn compact_into(buf: &mut Vec<u8>, value: i32) -> CompactResult<usize> {
    let encoded = compact(value)?;
    buf.extend_from_slice(&encoded);
    Ok(encoded.len())
}

/// Decode a compact number from exactly the bytes `compact` produced.
///
/// A sub-range of a larger buffer is passed as `&bytes[offset..offset + length]`.
pub fn decompact(bytes: &[u8]) -> CompactResult<i32> {
    let (value, consumed) = decode_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(CompactError::TrailingBytes {
            consumed,
            len: bytes.len(),
        });
    }
    Ok(value)
}

/// Decode a compact number from the front of `data`. Returns (value, bytes_consumed).
///
/// Never looks at more than [`MAX_COMPACT_BYTES`] bytes.
pub fn decode_prefix(data: &[u8]) -> CompactResult<(i32, usize)> {
    if data.is_empty() {
        return Err(CompactError::Empty);
    }

    let mut value: u32 = 0;
    for (i, &byte) in data.iter().take(MAX_COMPACT_BYTES).enumerate() {
        value |= u32::from(byte & PAYLOAD_MASK) << (PAYLOAD_BITS * i);
        if byte & CONTINUATION_FLAG == 0 {
            let len = i + 1;
            // A zero final group means a shorter encoding existed.
            if len > 1 && byte == 0 {
                trace!(len, "rejecting non-canonical compact number");
                return Err(CompactError::NonCanonical { len });
            }
            return Ok((value as i32, len));
        }
    }

    if data.len() >= MAX_COMPACT_BYTES {
        trace!("compact number missing terminator");
        Err(CompactError::Unterminated)
    } else {
        Err(CompactError::Truncated { len: data.len() })
    }
}
