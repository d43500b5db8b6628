//! Byte stream primitives shared by the .lines parser.
//!
//! [`DataStream`] reads fixed-width little-endian values and varuints from
//! any [`std::io::Read`], [`LimitedReader`] bounds a child region of a
//! stream, and [`Writer`] produces the same encodings (used by fixtures and
//! round-trip tests).

use thiserror::Error;

pub mod data_stream;
pub mod limited_reader;
pub mod writer;

pub use data_stream::DataStream;
pub use limited_reader::LimitedReader;
pub use writer::Writer;

/// Errors raised by the low-level byte readers.
#[derive(Debug, Error)]
pub enum BufferError {
    /// No bytes were available where a value was expected.
    #[error("end of stream")]
    EndOfStream,
    /// A value started but the stream ended before it was complete.
    #[error("truncated read")]
    Truncated,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
