use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::config::ImporterConfig;
use crate::error::{SerialError, SerialResult};
use crate::export::Exporter;
use crate::import::{scan_compact, Importer};

/// Exporter bound to an [`io::Write`] sink.
///
/// Each call writes its bytes fully or fails. The first sink failure poisons
/// the instance: every later call returns [`SerialError::Poisoned`] without
/// touching the sink, whose position is then unknown. Buffering, if wanted,
/// belongs to the sink (wrap it in a `BufWriter`).
pub struct StreamExporter<W: Write> {
    sink: W,
    written: u64,
    poisoned: bool,
}

impl<W: Write> StreamExporter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            written: 0,
            poisoned: false,
        }
    }

    /// Bytes successfully handed to the sink.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> SerialResult<()> {
        self.transfer(0, |w| w.flush())
    }

    fn transfer<F>(&mut self, n: usize, op: F) -> SerialResult<()>
    where
        F: FnOnce(&mut W) -> io::Result<()>,
    {
        if self.poisoned {
            return Err(SerialError::Poisoned);
        }
        match op(&mut self.sink) {
            Ok(()) => {
                self.written += n as u64;
                Ok(())
            }
            Err(e) => {
                self.poisoned = true;
                debug!(error = %e, written = self.written, "sink failed, exporter poisoned");
                Err(e.into())
            }
        }
    }
}

impl<W: Write> Exporter for StreamExporter<W> {
    fn write_bytes(&mut self, data: &[u8]) -> SerialResult<usize> {
        self.transfer(data.len(), |w| w.write_all(data))?;
        Ok(data.len())
    }

    fn write_boolean(&mut self, v: bool) -> SerialResult<()> {
        self.transfer(1, |w| w.write_u8(u8::from(v)))
    }

    fn write_byte(&mut self, v: u8) -> SerialResult<()> {
        self.transfer(1, |w| w.write_u8(v))
    }

    fn write_short(&mut self, v: i16) -> SerialResult<()> {
        self.transfer(2, |w| w.write_i16::<BigEndian>(v))
    }

    fn write_char(&mut self, v: u16) -> SerialResult<()> {
        self.transfer(2, |w| w.write_u16::<BigEndian>(v))
    }

    fn write_int(&mut self, v: i32) -> SerialResult<()> {
        self.transfer(4, |w| w.write_i32::<BigEndian>(v))
    }

    fn write_long(&mut self, v: i64) -> SerialResult<()> {
        self.transfer(8, |w| w.write_i64::<BigEndian>(v))
    }

    fn write_float(&mut self, v: f32) -> SerialResult<()> {
        self.transfer(4, |w| w.write_f32::<BigEndian>(v))
    }

    fn write_double(&mut self, v: f64) -> SerialResult<()> {
        self.transfer(8, |w| w.write_f64::<BigEndian>(v))
    }
}

/// Importer bound to an [`io::Read`] source.
///
/// A source that runs dry mid-value fails with an `UnexpectedEof` I/O error.
/// Like [`StreamExporter`], the first transfer failure, malformed compact
/// number or over-limit array count poisons the instance.
pub struct StreamImporter<R: Read> {
    source: R,
    read: u64,
    poisoned: bool,
    config: ImporterConfig,
}

impl<R: Read> StreamImporter<R> {
    pub fn new(source: R) -> Self {
        Self::with_config(source, ImporterConfig::default())
    }

    pub fn with_config(source: R, config: ImporterConfig) -> Self {
        Self {
            source,
            read: 0,
            poisoned: false,
            config,
        }
    }

    /// Bytes consumed from the source.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn transfer<T, F>(&mut self, n: usize, op: F) -> SerialResult<T>
    where
        F: FnOnce(&mut R) -> io::Result<T>,
    {
        if self.poisoned {
            return Err(SerialError::Poisoned);
        }
        match op(&mut self.source) {
            Ok(v) => {
                self.read += n as u64;
                Ok(v)
            }
            Err(e) => {
                self.poisoned = true;
                debug!(error = %e, read = self.read, "source failed, importer poisoned");
                Err(e.into())
            }
        }
    }
}

impl<R: Read> Importer for StreamImporter<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> SerialResult<usize> {
        let n = buf.len();
        self.transfer(n, |r| r.read_exact(buf))?;
        Ok(n)
    }

    fn read_boolean(&mut self) -> SerialResult<bool> {
        Ok(self.transfer(1, |r| r.read_u8())? != 0)
    }

    fn read_byte(&mut self) -> SerialResult<u8> {
        self.transfer(1, |r| r.read_u8())
    }

    fn read_short(&mut self) -> SerialResult<i16> {
        self.transfer(2, |r| r.read_i16::<BigEndian>())
    }

    fn read_char(&mut self) -> SerialResult<u16> {
        self.transfer(2, |r| r.read_u16::<BigEndian>())
    }

    fn read_int(&mut self) -> SerialResult<i32> {
        self.transfer(4, |r| r.read_i32::<BigEndian>())
    }

    fn read_long(&mut self) -> SerialResult<i64> {
        self.transfer(8, |r| r.read_i64::<BigEndian>())
    }

    fn read_float(&mut self) -> SerialResult<f32> {
        self.transfer(4, |r| r.read_f32::<BigEndian>())
    }

    fn read_double(&mut self) -> SerialResult<f64> {
        self.transfer(8, |r| r.read_f64::<BigEndian>())
    }

    fn max_array_len(&self) -> usize {
        self.config.max_array_len
    }

    fn read_array_len(&mut self) -> SerialResult<usize> {
        let len = self.read_compact_number()? as usize;
        let max = self.config.max_array_len;
        if len > max {
            // the count is consumed, so the stream now sits inside the array body
            self.poisoned = true;
            debug!(len, max, read = self.read, "array count over limit, importer poisoned");
            return Err(SerialError::ArrayTooLarge { len, max });
        }
        Ok(len)
    }

    fn read_compact_number(&mut self) -> SerialResult<i32> {
        let result = scan_compact(|| self.read_byte());
        if let Err(SerialError::Compact(e)) = &result {
            self.poisoned = true;
            debug!(error = %e, read = self.read, "malformed compact number, importer poisoned");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn export_with<F>(f: F) -> Vec<u8>
    where
        F: FnOnce(&mut StreamExporter<Vec<u8>>) -> SerialResult<()>,
    {
        let mut out = StreamExporter::new(Vec::new());
        f(&mut out).unwrap();
        out.into_inner()
    }

    /// Sink that accepts `budget` bytes and then fails.
    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn int_string_bool_scenario() {
        let bytes = export_with(|out| {
            out.write_int(300)?;
            out.write_string("ok")?;
            out.write_boolean(true)
        });
        assert_eq!(bytes, [0, 0, 0x01, 0x2C, 0x02, b'o', b'k', 0x01]);

        let mut input = StreamImporter::new(bytes.as_slice());
        assert_eq!(input.read_int().unwrap(), 300);
        assert_eq!(input.read_string().unwrap(), "ok");
        assert!(input.read_boolean().unwrap());
        assert_eq!(input.bytes_read(), 8);
    }

    #[test]
    fn empty_int_array_then_long_array() {
        let longs = [1i64, -1, i64::MAX];
        let bytes = export_with(|out| {
            out.write_int_array(&[])?;
            out.write_long_array(&longs)
        });
        assert_eq!(bytes.len(), 1 + 1 + 3 * 8);

        let mut input = StreamImporter::new(bytes.as_slice());
        assert!(input.read_int_array().unwrap().is_empty());
        assert_eq!(input.read_long_array().unwrap(), longs);
    }

    #[test]
    fn truncated_array_is_io_error() {
        let mut bytes = export_with(|out| out.write_double_array(&[1.0, 2.0, 3.0]));
        bytes.truncate(bytes.len() - 3);

        let mut input = StreamImporter::new(bytes.as_slice());
        let err = input.read_double_array().unwrap_err();
        assert!(err.is_unexpected_eof());
        assert!(err.is_fatal_io());
        assert!(input.is_poisoned());
    }

    #[test]
    fn poisoned_importer_refuses_further_reads() {
        let mut input = StreamImporter::new(&[0x01][..]);
        assert!(input.read_int().is_err());
        assert!(matches!(input.read_byte(), Err(SerialError::Poisoned)));
    }

    #[test]
    fn malformed_compact_poisons_importer() {
        let mut input = StreamImporter::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00][..]);
        let err = input.read_compact_number().unwrap_err();
        assert!(err.is_fatal_io());
        assert_eq!(input.bytes_read(), 4);
        assert!(matches!(input.read_byte(), Err(SerialError::Poisoned)));
    }

    #[test]
    fn sink_failure_poisons_exporter() {
        let mut out = StreamExporter::new(FailingSink { budget: 6 });
        out.write_int(1).unwrap();
        let err = out.write_long(2).unwrap_err();
        assert!(matches!(err, SerialError::Io(_)));
        assert!(out.is_poisoned());
        assert!(matches!(out.write_byte(0), Err(SerialError::Poisoned)));
        assert_eq!(out.bytes_written(), 4);
    }

    #[test]
    fn validation_failure_does_not_poison() {
        let mut out = StreamExporter::new(Vec::new());
        assert!(out.write_string("naïve").is_err());
        assert!(!out.is_poisoned());
        out.write_string("naive").unwrap();
        assert_eq!(out.bytes_written(), 6);
    }

    #[test]
    fn caller_sized_read_consumes_no_count() {
        let bytes = export_with(|out| out.write_chars(&[0x41, 0x42]).map(drop));
        assert_eq!(bytes, [0, 0x41, 0, 0x42]);

        let mut buf = [0u16; 2];
        let mut input = StreamImporter::new(bytes.as_slice());
        assert_eq!(input.read_chars(&mut buf).unwrap(), 2);
        assert_eq!(buf, [0x41, 0x42]);
    }

    #[test]
    fn config_limit_applies() {
        let bytes = export_with(|out| out.write_byte_array(&[0u8; 16]));
        let mut input =
            StreamImporter::with_config(bytes.as_slice(), ImporterConfig::with_max_array_len(8));
        let err = input.read_byte_array().unwrap_err();
        assert!(matches!(err, SerialError::ArrayTooLarge { len: 16, max: 8 }));
    }

    #[test]
    fn over_limit_count_poisons_importer() {
        let bytes = export_with(|out| {
            out.write_byte_array(&[0xAA, 0xBB, 0xCC])?;
            out.write_int(7)
        });
        let mut input =
            StreamImporter::with_config(bytes.as_slice(), ImporterConfig::with_max_array_len(2));
        let err = input.read_byte_array().unwrap_err();
        assert!(matches!(err, SerialError::ArrayTooLarge { len: 3, max: 2 }));
        assert!(input.is_poisoned());
        assert_eq!(input.bytes_read(), 1);
        assert!(matches!(input.read_int(), Err(SerialError::Poisoned)));
    }

    #[test]
    fn count_at_limit_accepted() {
        let bytes = export_with(|out| out.write_short_array(&[1, 2]));
        let mut input =
            StreamImporter::with_config(bytes.as_slice(), ImporterConfig::with_max_array_len(2));
        assert_eq!(input.read_short_array().unwrap(), vec![1, 2]);
        assert!(!input.is_poisoned());
    }

    #[test]
    fn mismatched_read_is_deterministic_misinterpretation() {
        let bytes = export_with(|out| {
            out.write_short(1)?;
            out.write_short(2)
        });
        let mut input = StreamImporter::new(bytes.as_slice());
        assert_eq!(input.read_int().unwrap(), 0x0001_0002);
    }

    #[test]
    fn independent_instances_on_threads() {
        let handles: Vec<_> = (0..4)
            .map(|i: i32| {
                std::thread::spawn(move || {
                    let mut out = StreamExporter::new(Vec::new());
                    out.write_int(i).unwrap();
                    out.write_string("thread").unwrap();
                    let bytes = out.into_inner();
                    let mut input = StreamImporter::new(bytes.as_slice());
                    (input.read_int().unwrap(), input.read_string().unwrap())
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), (i as i32, "thread".to_string()));
        }
    }

    #[test]
    fn nan_bit_pattern_preserved() {
        let nan = f64::from_bits(0x7FF8_0000_0000_0001);
        let bytes = export_with(|out| out.write_double(nan));
        let mut input = StreamImporter::new(bytes.as_slice());
        assert_eq!(input.read_double().unwrap().to_bits(), nan.to_bits());
    }

    proptest! {
        #[test]
        fn mixed_primitives_roundtrip(
            b in any::<bool>(),
            y in any::<u8>(),
            s in any::<i16>(),
            c in any::<u16>(),
            i in any::<i32>(),
            l in any::<i64>(),
            f in any::<f32>(),
            d in any::<f64>(),
        ) {
            let bytes = export_with(|out| {
                out.write_boolean(b)?;
                out.write_byte(y)?;
                out.write_short(s)?;
                out.write_char(c)?;
                out.write_int(i)?;
                out.write_long(l)?;
                out.write_float(f)?;
                out.write_double(d)
            });
            prop_assert_eq!(bytes.len(), 1 + 1 + 2 + 2 + 4 + 8 + 4 + 8);

            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_boolean().unwrap(), b);
            prop_assert_eq!(input.read_byte().unwrap(), y);
            prop_assert_eq!(input.read_short().unwrap(), s);
            prop_assert_eq!(input.read_char().unwrap(), c);
            prop_assert_eq!(input.read_int().unwrap(), i);
            prop_assert_eq!(input.read_long().unwrap(), l);
            prop_assert_eq!(input.read_float().unwrap().to_bits(), f.to_bits());
            prop_assert_eq!(input.read_double().unwrap().to_bits(), d.to_bits());
        }

        #[test]
        fn int_arrays_roundtrip(values in proptest::collection::vec(any::<i32>(), 0..300)) {
            let bytes = export_with(|out| out.write_int_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_int_array().unwrap(), values);
        }

        #[test]
        fn byte_arrays_roundtrip(values in proptest::collection::vec(any::<u8>(), 0..300)) {
            let bytes = export_with(|out| out.write_byte_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_byte_array().unwrap(), values);
        }

        #[test]
        fn short_arrays_roundtrip(values in proptest::collection::vec(any::<i16>(), 0..300)) {
            let bytes = export_with(|out| out.write_short_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_short_array().unwrap(), values);
        }

        #[test]
        fn char_arrays_roundtrip(values in proptest::collection::vec(any::<u16>(), 0..300)) {
            let bytes = export_with(|out| out.write_char_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_char_array().unwrap(), values);
        }

        #[test]
        fn long_arrays_roundtrip(values in proptest::collection::vec(any::<i64>(), 0..300)) {
            let bytes = export_with(|out| out.write_long_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_long_array().unwrap(), values);
        }

        #[test]
        fn float_arrays_roundtrip(values in proptest::collection::vec(any::<f32>(), 0..300)) {
            let bytes = export_with(|out| out.write_float_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            let back: Vec<u32> = input.read_float_array().unwrap().iter().map(|f| f.to_bits()).collect();
            let expected: Vec<u32> = values.iter().map(|f| f.to_bits()).collect();
            prop_assert_eq!(back, expected);
        }

        #[test]
        fn double_arrays_roundtrip(values in proptest::collection::vec(any::<f64>(), 0..300)) {
            let bytes = export_with(|out| out.write_double_array(&values));
            let mut input = StreamImporter::new(bytes.as_slice());
            let back: Vec<u64> = input.read_double_array().unwrap().iter().map(|d| d.to_bits()).collect();
            let expected: Vec<u64> = values.iter().map(|d| d.to_bits()).collect();
            prop_assert_eq!(back, expected);
        }

        #[test]
        fn ascii_strings_roundtrip(s in "[ -~]{0,200}") {
            let bytes = export_with(|out| out.write_string(&s));
            let mut input = StreamImporter::new(bytes.as_slice());
            prop_assert_eq!(input.read_string().unwrap(), s);
        }
    }
}
