use ferrule_compact::{compact, MAX_COMPACT_VALUE};

use crate::error::{SerialError, SerialResult};
use crate::object::Exportable;

/// Writer half of the wire format.
///
/// Implementors supply raw byte output and the fixed-width big-endian
/// primitives. Compact numbers, strings, bulk slices and length-prefixed
/// arrays are layered on top here, so every exporter produces the same
/// grammar.
///
/// Sub-ranges of a larger array are written by passing a sub-slice.
pub trait Exporter {
    /// Append `data` verbatim. Returns the number of bytes written.
    fn write_bytes(&mut self, data: &[u8]) -> SerialResult<usize>;

    fn write_boolean(&mut self, v: bool) -> SerialResult<()>;
    fn write_byte(&mut self, v: u8) -> SerialResult<()>;
    fn write_short(&mut self, v: i16) -> SerialResult<()>;
    /// A UTF-16 code unit.
    fn write_char(&mut self, v: u16) -> SerialResult<()>;
    fn write_int(&mut self, v: i32) -> SerialResult<()>;
    fn write_long(&mut self, v: i64) -> SerialResult<()>;
    fn write_float(&mut self, v: f32) -> SerialResult<()>;
    fn write_double(&mut self, v: f64) -> SerialResult<()>;

    /// Write `v` as a compact number.
    fn write_compact_number(&mut self, v: i32) -> SerialResult<()> {
        let encoded = compact(v)?;
        self.write_bytes(&encoded)?;
        Ok(())
    }

    /// Write an ASCII string as a compact byte length followed by its bytes.
    ///
    /// Fails before writing anything if `s` contains a non-ASCII character.
    fn write_string(&mut self, s: &str) -> SerialResult<()> {
        if let Some(index) = s.bytes().position(|b| !b.is_ascii()) {
            return Err(SerialError::NonAscii {
                index,
                byte: s.as_bytes()[index],
            });
        }
        self.write_byte_array(s.as_bytes())
    }

    fn write_shorts(&mut self, values: &[i16]) -> SerialResult<usize> {
        for &v in values {
            self.write_short(v)?;
        }
        Ok(values.len())
    }

    fn write_chars(&mut self, values: &[u16]) -> SerialResult<usize> {
        for &v in values {
            self.write_char(v)?;
        }
        Ok(values.len())
    }

    fn write_ints(&mut self, values: &[i32]) -> SerialResult<usize> {
        for &v in values {
            self.write_int(v)?;
        }
        Ok(values.len())
    }

    fn write_longs(&mut self, values: &[i64]) -> SerialResult<usize> {
        for &v in values {
            self.write_long(v)?;
        }
        Ok(values.len())
    }

    fn write_floats(&mut self, values: &[f32]) -> SerialResult<usize> {
        for &v in values {
            self.write_float(v)?;
        }
        Ok(values.len())
    }

    fn write_doubles(&mut self, values: &[f64]) -> SerialResult<usize> {
        for &v in values {
            self.write_double(v)?;
        }
        Ok(values.len())
    }

    fn write_byte_array(&mut self, values: &[u8]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_bytes(values)?;
        Ok(())
    }

    fn write_short_array(&mut self, values: &[i16]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_shorts(values)?;
        Ok(())
    }

    fn write_char_array(&mut self, values: &[u16]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_chars(values)?;
        Ok(())
    }

    fn write_int_array(&mut self, values: &[i32]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_ints(values)?;
        Ok(())
    }

    fn write_long_array(&mut self, values: &[i64]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_longs(values)?;
        Ok(())
    }

    fn write_float_array(&mut self, values: &[f32]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_floats(values)?;
        Ok(())
    }

    fn write_double_array(&mut self, values: &[f64]) -> SerialResult<()> {
        self.write_compact_number(wire_len(values.len())?)?;
        self.write_doubles(values)?;
        Ok(())
    }

    /// Let `object` write itself through this exporter.
    fn export_object(&mut self, object: &dyn Exportable) -> SerialResult<()>
    where
        Self: Sized,
    {
        object.export(self)
    }
}

/// Convert a slice length to a compact-number count.
fn wire_len(len: usize) -> SerialResult<i32> {
    match i32::try_from(len) {
        Ok(n) if n <= MAX_COMPACT_VALUE => Ok(n),
        _ => Err(SerialError::LengthOverflow { len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls so the layering can be checked without a stream.
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
    }

    impl Exporter for Recorder {
        fn write_bytes(&mut self, data: &[u8]) -> SerialResult<usize> {
            self.bytes.extend_from_slice(data);
            Ok(data.len())
        }
        fn write_boolean(&mut self, v: bool) -> SerialResult<()> {
            self.bytes.push(u8::from(v));
            Ok(())
        }
        fn write_byte(&mut self, v: u8) -> SerialResult<()> {
            self.bytes.push(v);
            Ok(())
        }
        fn write_short(&mut self, v: i16) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
        fn write_char(&mut self, v: u16) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
        fn write_int(&mut self, v: i32) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
        fn write_long(&mut self, v: i64) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
        fn write_float(&mut self, v: f32) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
        fn write_double(&mut self, v: f64) -> SerialResult<()> {
            self.write_bytes(&v.to_be_bytes()).map(drop)
        }
    }

    #[test]
    fn string_is_prefixed_bytes() {
        let mut r = Recorder::default();
        r.write_string("ok").unwrap();
        assert_eq!(r.bytes, [0x02, b'o', b'k']);
    }

    #[test]
    fn empty_string_is_single_zero() {
        let mut r = Recorder::default();
        r.write_string("").unwrap();
        assert_eq!(r.bytes, [0x00]);
    }

    #[test]
    fn non_ascii_string_writes_nothing() {
        let mut r = Recorder::default();
        let err = r.write_string("café").unwrap_err();
        assert!(matches!(err, SerialError::NonAscii { index: 3, byte: 0xC3 }));
        assert!(r.bytes.is_empty());
    }

    #[test]
    fn int_array_elements_are_fixed_width() {
        let mut r = Recorder::default();
        r.write_int_array(&[1, 2]).unwrap();
        assert_eq!(r.bytes, [0x02, 0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn bulk_writes_have_no_prefix() {
        let mut r = Recorder::default();
        let values = [7i16, 8, 9, 10];
        assert_eq!(r.write_shorts(&values[1..3]).unwrap(), 2);
        assert_eq!(r.bytes, [0, 8, 0, 9]);
    }

    #[test]
    fn large_array_uses_multibyte_count() {
        let mut r = Recorder::default();
        r.write_byte_array(&[0u8; 200]).unwrap();
        assert_eq!(&r.bytes[..2], &[0xC8, 0x01]);
        assert_eq!(r.bytes.len(), 202);
    }

    #[test]
    fn wire_len_limits() {
        assert_eq!(wire_len(0).unwrap(), 0);
        assert_eq!(wire_len(MAX_COMPACT_VALUE as usize).unwrap(), MAX_COMPACT_VALUE);
        let err = wire_len(MAX_COMPACT_VALUE as usize + 1).unwrap_err();
        assert!(matches!(err, SerialError::LengthOverflow { .. }));
    }

    #[test]
    fn negative_compact_rejected() {
        let mut r = Recorder::default();
        assert!(r.write_compact_number(-5).is_err());
        assert!(r.bytes.is_empty());
    }
}
