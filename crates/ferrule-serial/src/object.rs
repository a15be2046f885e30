use crate::error::{SerialError, SerialResult};
use crate::export::Exporter;
use crate::import::Importer;
use crate::size::SizeCounter;
use crate::stream::{StreamExporter, StreamImporter};

/// A value that writes itself through an [`Exporter`].
///
/// The wire form is exactly the sequence of writes `export` performs; there
/// are no tags or field markers. A nested value is written by calling its own
/// `export` with the same exporter.
pub trait Exportable {
    fn export(&self, out: &mut dyn Exporter) -> SerialResult<()>;
}

/// A value that populates itself from an [`Importer`].
///
/// `import` must issue the same reads, of the same types and in the same
/// order, as the paired `export`. Nothing on the wire can detect a mismatch.
pub trait Importable {
    fn import(&mut self, input: &mut dyn Importer) -> SerialResult<()>;
}

/// Serialize `object` into a new buffer.
pub fn to_bytes(object: &dyn Exportable) -> SerialResult<Vec<u8>> {
    let mut out = StreamExporter::new(Vec::new());
    object.export(&mut out)?;
    Ok(out.into_inner())
}

/// Number of bytes `object` occupies on the wire.
pub fn serialized_size(object: &dyn Exportable) -> SerialResult<usize> {
    let mut counter = SizeCounter::new();
    object.export(&mut counter)?;
    Ok(counter.size())
}

/// Build a `T` from `data`, which must hold exactly one serialized value.
pub fn from_bytes<T: Importable + Default>(data: &[u8]) -> SerialResult<T> {
    let mut input = StreamImporter::new(data);
    let mut value = T::default();
    value.import(&mut input)?;
    let remaining = input.get_ref().len();
    if remaining != 0 {
        return Err(SerialError::TrailingBytes(remaining));
    }
    Ok(value)
}
