//! Compact variable-length integer codec for the ferrule wire format.
//!
//! Every length and count field on the wire is a compact number: one to four
//! bytes, seven payload bits each, least significant group first. The high bit
//! of a byte is a continuation flag that is clear only on the final byte.
//!
//! | Value range            | Bytes |
//! |------------------------|-------|
//! | `0 ..= 0x7F`           | 1     |
//! | `0x80 ..= 0x3FFF`      | 2     |
//! | `0x4000 ..= 0x1FFFFF`  | 3     |
//! | `0x200000 ..= 0xFFFFFFF` | 4   |
//!
//! The encoder always emits the minimal form, and the decoder accepts nothing
//! else, so every representable value has exactly one encoding.

pub mod error;
pub mod number;

pub use error::{CompactError, CompactResult};
pub use number::{
    compact, compact_into, decode_prefix, decompact, encoded_len, CompactBytes,
    CONTINUATION_FLAG, MAX_COMPACT_BYTES, MAX_COMPACT_VALUE,
};
