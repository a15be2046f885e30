use std::io;

use ferrule_compact::CompactError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("compact number error: {0}")]
    Compact(#[from] CompactError),

    #[error("length {len} does not fit in a compact number")]
    LengthOverflow { len: usize },

    #[error("non-ASCII byte 0x{byte:02x} at index {index}")]
    NonAscii { index: usize, byte: u8 },

    #[error("array length {len} exceeds limit {max}")]
    ArrayTooLarge { len: usize, max: usize },

    #[error("{0} trailing bytes after object")]
    TrailingBytes(usize),

    #[error("instance unusable after an earlier failure")]
    Poisoned,
}

impl SerialError {
    /// True for the I/O class: transfer failures and malformed compact numbers
    /// read from the wire. Either one aborts the whole operation.
    pub fn is_fatal_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Compact(e) => !matches!(e, CompactError::OutOfRange(_)),
            _ => false,
        }
    }

    /// True if the source ran out before a read was satisfied.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

pub type SerialResult<T> = Result<T, SerialError>;
