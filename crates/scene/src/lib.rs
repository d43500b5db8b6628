//! Parser for reMarkable tablet v6 notebook files.
//!
//! A `.rm` file is a 43-byte header followed by tagged, length-prefixed
//! blocks. Blocks describe a scene tree: groups (layers) whose children are
//! CRDT-ordered sequences of nested groups, ink strokes and text. This crate
//! decodes that stream into an in-memory [`SceneTree`] and reconstructs
//! paragraphs and anchor positions from the CRDT text sequence.
//!
//! ```no_run
//! # fn main() -> Result<(), rmlines_scene::ParseError> {
//! let file = std::fs::File::open("page.rm").unwrap();
//! let tree = rmlines_scene::read_scene_tree(file)?;
//! println!("{} nodes", tree.nodes.len());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use rmlines_buffers::BufferError;

pub mod crdt;
pub mod scene_stream;
pub mod tagged_reader;
pub mod text;
pub mod types;

pub use crdt::{CrdtId, CrdtSequence, CrdtSequenceItem, LwwValue};
pub use scene_stream::{read_scene_tree, SceneTree};
pub use tagged_reader::{BlockInfo, TagType, TaggedBlockReader};
pub use text::{build_text_document, Paragraph, TextDocument, TEXT_TOP_Y};
pub use types::{Group, Line, ParagraphStyle, Pen, PenColor, Point, Rgba, SceneItem, Text};

/// Errors raised while decoding a `.rm` stream.
///
/// Only [`ParseError::BadHeader`] and errors hit between blocks are fatal
/// for a whole file; anything raised inside a block payload is caught by
/// the scene decoder, logged, and the block skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a reMarkable .lines v6 file")]
    BadHeader,
    #[error("expected tag ({expected_index}, {expected:?}), got ({actual_index}, 0x{actual_type:X})")]
    TagMismatch {
        expected_index: u64,
        expected: TagType,
        actual_index: u64,
        actual_type: u8,
    },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
