use thiserror::Error;

/// Errors produced while encoding or decoding a compact number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompactError {
    #[error("value {0} outside compact number range 0..={max}", max = crate::MAX_COMPACT_VALUE)]
    OutOfRange(i32),

    #[error("empty compact number")]
    Empty,

    #[error("compact number not terminated within {max} bytes", max = crate::MAX_COMPACT_BYTES)]
    Unterminated,

    #[error("truncated compact number: {len} byte(s) with continuation flag still set")]
    Truncated { len: usize },

    #[error("compact number terminated after {consumed} of {len} bytes")]
    TrailingBytes { consumed: usize, len: usize },

    #[error("non-canonical compact number: {len} bytes for a shorter value")]
    NonCanonical { len: usize },
}

pub type CompactResult<T> = Result<T, CompactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_limits() {
        assert_eq!(
            CompactError::OutOfRange(-1).to_string(),
            "value -1 outside compact number range 0..=268435455"
        );
        assert_eq!(
            CompactError::Unterminated.to_string(),
            "compact number not terminated within 4 bytes"
        );
    }
}
