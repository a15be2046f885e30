//! Symmetric binary serialization for ferrule.
//!
//! An [`Exporter`] turns a sequence of primitive writes into bytes; an
//! [`Importer`] turns the same bytes back into the same sequence of values.
//! Nothing on the wire describes its own layout, so a reader must issue
//! exactly the reads, in exactly the order, that the writer issued.
//!
//! # Wire grammar
//!
//! | Element | Encoding |
//! |---|---|
//! | bool | 1 byte, `0x00` false, anything else true |
//! | byte | 1 byte |
//! | short / char | 2 bytes, big-endian |
//! | int / float | 4 bytes, big-endian (IEEE-754 bits for float) |
//! | long / double | 8 bytes, big-endian (IEEE-754 bits for double) |
//! | compact number | 1 to 4 bytes, see [`ferrule_compact`] |
//! | string | compact byte length, then ASCII bytes |
//! | array(T) | compact element count, then fixed-width T values |
//!
//! # Structured values
//!
//! Types implement [`Exportable`] and [`Importable`] to write and read
//! themselves field by field. Nested values simply call each other, which
//! produces a flat byte stream with no markers.
//!
//! An exporter or importer instance owns its position in the stream and takes
//! `&mut self` for every call. Run one instance per stream; independent
//! instances may live on separate threads.

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod object;
pub mod size;
pub mod stream;

pub use config::ImporterConfig;
pub use error::{SerialError, SerialResult};
pub use export::Exporter;
pub use import::Importer;
pub use object::{from_bytes, serialized_size, to_bytes, Exportable, Importable};
pub use size::SizeCounter;
pub use stream::{StreamExporter, StreamImporter};
