use crate::error::SerialResult;
use crate::export::Exporter;

/// An exporter that discards its input and counts the bytes it would produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeCounter {
    size: usize,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes counted so far.
    pub fn size(&self) -> usize {
        self.size
    }

    fn add(&mut self, n: usize) {
        self.size += n;
    }
}

impl Exporter for SizeCounter {
    fn write_bytes(&mut self, data: &[u8]) -> SerialResult<usize> {
        self.add(data.len());
        Ok(data.len())
    }

    fn write_boolean(&mut self, _: bool) -> SerialResult<()> {
        self.add(1);
        Ok(())
    }

    fn write_byte(&mut self, _: u8) -> SerialResult<()> {
        self.add(1);
        Ok(())
    }

    fn write_short(&mut self, _: i16) -> SerialResult<()> {
        self.add(2);
        Ok(())
    }

    fn write_char(&mut self, _: u16) -> SerialResult<()> {
        self.add(2);
        Ok(())
    }

    fn write_int(&mut self, _: i32) -> SerialResult<()> {
        self.add(4);
        Ok(())
    }

    fn write_long(&mut self, _: i64) -> SerialResult<()> {
        self.add(8);
        Ok(())
    }

    fn write_float(&mut self, _: f32) -> SerialResult<()> {
        self.add(4);
        Ok(())
    }

    fn write_double(&mut self, _: f64) -> SerialResult<()> {
        self.add(8);
        Ok(())
    }

    fn write_compact_number(&mut self, v: i32) -> SerialResult<()> {
        self.add(ferrule_compact::encoded_len(v)?);
        Ok(())
    }
}
