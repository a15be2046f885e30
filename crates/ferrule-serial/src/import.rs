use ferrule_compact::{decompact, CONTINUATION_FLAG, MAX_COMPACT_BYTES, MAX_COMPACT_VALUE};

use crate::error::{SerialError, SerialResult};
use crate::object::Importable;

/// Reader half of the wire format, the mirror of [`Exporter`](crate::Exporter).
///
/// Arrays come in two non-interchangeable flavours:
///
/// - `read_*_array` reads a compact count from the wire and allocates a fresh
///   vector of that size;
/// - `read_*s` fills a caller-sized buffer and reads no count at all, for
///   fixed-size repeated fields whose length both sides already know.
pub trait Importer {
    /// Fill `buf` completely from the source. Returns `buf.len()`.
    fn read_bytes(&mut self, buf: &mut [u8]) -> SerialResult<usize>;

    fn read_boolean(&mut self) -> SerialResult<bool>;
    fn read_byte(&mut self) -> SerialResult<u8>;
    fn read_short(&mut self) -> SerialResult<i16>;
    fn read_char(&mut self) -> SerialResult<u16>;
    fn read_int(&mut self) -> SerialResult<i32>;
    fn read_long(&mut self) -> SerialResult<i64>;
    fn read_float(&mut self) -> SerialResult<f32>;
    fn read_double(&mut self) -> SerialResult<f64>;

    /// Largest element count this importer will allocate for.
    fn max_array_len(&self) -> usize {
        MAX_COMPACT_VALUE as usize
    }

    fn read_compact_number(&mut self) -> SerialResult<i32> {
        scan_compact(|| self.read_byte())
    }

    /// Read a compact element count and check it against [`max_array_len`](Self::max_array_len).
    fn read_array_len(&mut self) -> SerialResult<usize> {
        // decompact never yields a negative value
        let len = self.read_compact_number()? as usize;
        let max = self.max_array_len();
        if len > max {
            return Err(SerialError::ArrayTooLarge { len, max });
        }
        Ok(len)
    }

    /// Read a string written by [`Exporter::write_string`](crate::Exporter::write_string).
    fn read_string(&mut self) -> SerialResult<String> {
        let bytes = self.read_byte_array()?;
        if let Some(index) = bytes.iter().position(|b| !b.is_ascii()) {
            return Err(SerialError::NonAscii {
                index,
                byte: bytes[index],
            });
        }
        Ok(bytes.into_iter().map(char::from).collect())
    }

    fn read_shorts(&mut self, buf: &mut [i16]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_short()?;
        }
        Ok(buf.len())
    }

    fn read_chars(&mut self, buf: &mut [u16]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_char()?;
        }
        Ok(buf.len())
    }

    fn read_ints(&mut self, buf: &mut [i32]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_int()?;
        }
        Ok(buf.len())
    }

    fn read_longs(&mut self, buf: &mut [i64]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_long()?;
        }
        Ok(buf.len())
    }

    fn read_floats(&mut self, buf: &mut [f32]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_float()?;
        }
        Ok(buf.len())
    }

    fn read_doubles(&mut self, buf: &mut [f64]) -> SerialResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.read_double()?;
        }
        Ok(buf.len())
    }

    fn read_byte_array(&mut self) -> SerialResult<Vec<u8>> {
        let mut out = vec![0u8; self.read_array_len()?];
        self.read_bytes(&mut out)?;
        Ok(out)
    }

    fn read_short_array(&mut self) -> SerialResult<Vec<i16>> {
        let mut out = vec![0i16; self.read_array_len()?];
        self.read_shorts(&mut out)?;
        Ok(out)
    }

    fn read_char_array(&mut self) -> SerialResult<Vec<u16>> {
        let mut out = vec![0u16; self.read_array_len()?];
        self.read_chars(&mut out)?;
        Ok(out)
    }

    fn read_int_array(&mut self) -> SerialResult<Vec<i32>> {
        let mut out = vec![0i32; self.read_array_len()?];
        self.read_ints(&mut out)?;
        Ok(out)
    }

    fn read_long_array(&mut self) -> SerialResult<Vec<i64>> {
        let mut out = vec![0i64; self.read_array_len()?];
        self.read_longs(&mut out)?;
        Ok(out)
    }

    fn read_float_array(&mut self) -> SerialResult<Vec<f32>> {
        let mut out = vec![0f32; self.read_array_len()?];
        self.read_floats(&mut out)?;
        Ok(out)
    }

    fn read_double_array(&mut self) -> SerialResult<Vec<f64>> {
        let mut out = vec![0f64; self.read_array_len()?];
        self.read_doubles(&mut out)?;
        Ok(out)
    }

    /// Let `object` populate itself from this importer.
    fn import_object(&mut self, object: &mut dyn Importable) -> SerialResult<()>
    where
        Self: Sized,
    {
        object.import(self)
    }
}

/// Pull bytes until one arrives with the continuation flag clear, or the
/// four-byte budget is spent, then decode the run.
pub(crate) fn scan_compact<F>(mut next: F) -> SerialResult<i32>
where
    F: FnMut() -> SerialResult<u8>,
{
    let mut run = [0u8; MAX_COMPACT_BYTES];
    let mut len = 0;
    while len < MAX_COMPACT_BYTES {
        let byte = next()?;
        run[len] = byte;
        len += 1;
        if byte & CONTINUATION_FLAG == 0 {
            break;
        }
    }
    Ok(decompact(&run[..len])?)
}
