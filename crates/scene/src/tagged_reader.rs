//! Tagged block framing: the structural layer of the .lines format.
//!
//! Every value in a block payload is announced by a tag — a varuint whose
//! high bits are a field index and whose low nibble is a [`TagType`]. Blocks
//! themselves are length-prefixed, and [`TaggedBlockReader::end_block`]
//! resynchronises the stream past whatever a block's consumer left behind,
//! which is what makes unknown block content safe to skip.

use std::io::Read;

use rmlines_buffers::data_stream::decode_varuint;
use rmlines_buffers::{DataStream, LimitedReader};

use crate::crdt::{CrdtId, LwwValue};
use crate::ParseError;

/// The 43-byte magic every v6 file starts with.
pub const HEADER_V6: &[u8; 43] = b"reMarkable .lines file, version=6          ";

/// How many bytes of payload a tag look-ahead may examine.
const PEEK_WINDOW: usize = 10;

/// Type nibble of a tag, announcing the width of the value that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Id,
    Length4,
    Byte8,
    Byte4,
    Byte1,
}

impl TagType {
    pub fn from_nibble(v: u8) -> Option<TagType> {
        match v {
            0xF => Some(TagType::Id),
            0xC => Some(TagType::Length4),
            0x8 => Some(TagType::Byte8),
            0x4 => Some(TagType::Byte4),
            0x1 => Some(TagType::Byte1),
            _ => None,
        }
    }

    pub fn nibble(self) -> u8 {
        match self {
            TagType::Id => 0xF,
            TagType::Length4 => 0xC,
            TagType::Byte8 => 0x8,
            TagType::Byte4 => 0x4,
            TagType::Byte1 => 0x1,
        }
    }
}

/// Header of one top-level block.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    /// Payload length; does not include the 8-byte block header.
    pub size: u32,
    pub block_type: u8,
    pub min_version: u8,
    pub current_version: u8,
}

/// Reads tagged blocks and their typed payload fields from a byte stream.
///
/// While a block is open, all reads are bounded to its payload; the bound
/// doubles as the optionality signal for trailing fields
/// ([`remaining_in_block`](Self::remaining_in_block)).
pub struct TaggedBlockReader<R> {
    data: DataStream<LimitedReader<R>>,
    current: Option<BlockInfo>,
}

impl<R: Read> TaggedBlockReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            data: DataStream::new(LimitedReader::new(inner)),
            current: None,
        }
    }

    /// Reads and validates the file header.
    pub fn read_header(&mut self) -> Result<(), ParseError> {
        let mut header = [0u8; HEADER_V6.len()];
        self.data.fill(&mut header).map_err(|_| ParseError::BadHeader)?;
        if &header != HEADER_V6 {
            return Err(ParseError::BadHeader);
        }
        Ok(())
    }

    /// Reads the next block header and bounds the payload stream to it.
    ///
    /// Returns `Ok(None)` on a clean end of input (no bytes where the next
    /// block would start).
    pub fn read_block(&mut self) -> Result<Option<BlockInfo>, ParseError> {
        debug_assert!(self.current.is_none(), "previous block not ended");
        let size = match self.data.u32_le() {
            Ok(v) => v,
            Err(rmlines_buffers::BufferError::EndOfStream) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let _reserved = self.data.u8()?;
        let min_version = self.data.u8()?;
        let current_version = self.data.u8()?;
        let block_type = self.data.u8()?;

        let info = BlockInfo {
            size,
            block_type,
            min_version,
            current_version,
        };
        self.data.get_mut().set_limit(size as u64);
        self.current = Some(info);
        Ok(Some(info))
    }

    /// Closes the current block, discarding any unconsumed payload so the
    /// stream sits exactly at the start of the next block header.
    pub fn end_block(&mut self) -> Result<(), ParseError> {
        if self.current.is_none() {
            return Ok(());
        }
        self.data.discard_peeked();
        let skipped = self.data.get_mut().skip_remaining();
        self.data.get_mut().clear_limit();
        self.current = None;
        skipped?;
        Ok(())
    }

    /// Payload bytes of the current block not yet consumed.
    pub fn remaining_in_block(&self) -> u64 {
        let buffered = self.data.peeked_len() as u64;
        buffered + self.data.get_ref().remaining().unwrap_or(0)
    }

    /// Reports whether the next bytes decode to a tag with the given field
    /// index and type, without consuming anything.
    ///
    /// This is the only look-ahead the format needs: optional sub-blocks
    /// and the optional stroke move-id are both detected with it.
    pub fn peek_tag(&mut self, index: u64, tag_type: TagType) -> bool {
        let Ok(window) = self.data.peek(PEEK_WINDOW) else {
            return false;
        };
        match decode_varuint(window) {
            Some((value, _)) => value >> 4 == index && (value & 0xF) as u8 == tag_type.nibble(),
            None => false,
        }
    }

    /// Reports whether a sub-block with the given index starts here.
    pub fn has_subblock(&mut self, index: u64) -> bool {
        self.peek_tag(index, TagType::Length4)
    }

    fn expect_tag(&mut self, index: u64, expected: TagType) -> Result<(), ParseError> {
        let raw = self.data.varuint()?;
        let actual_index = raw >> 4;
        let actual_type = (raw & 0xF) as u8;
        if actual_index != index || actual_type != expected.nibble() {
            return Err(ParseError::TagMismatch {
                expected_index: index,
                expected,
                actual_index,
                actual_type,
            });
        }
        Ok(())
    }

    /// Opens a sub-block and returns its payload length.
    pub fn read_subblock(&mut self, index: u64) -> Result<u32, ParseError> {
        self.expect_tag(index, TagType::Length4)?;
        Ok(self.data.u32_le()?)
    }

    pub fn read_id(&mut self, index: u64) -> Result<CrdtId, ParseError> {
        self.expect_tag(index, TagType::Id)?;
        self.crdt_id()
    }

    pub fn read_bool(&mut self, index: u64) -> Result<bool, ParseError> {
        self.expect_tag(index, TagType::Byte1)?;
        Ok(self.data.bool()?)
    }

    pub fn read_byte(&mut self, index: u64) -> Result<u8, ParseError> {
        self.expect_tag(index, TagType::Byte1)?;
        Ok(self.data.u8()?)
    }

    pub fn read_u32(&mut self, index: u64) -> Result<u32, ParseError> {
        self.expect_tag(index, TagType::Byte4)?;
        Ok(self.data.u32_le()?)
    }

    pub fn read_f32(&mut self, index: u64) -> Result<f32, ParseError> {
        self.expect_tag(index, TagType::Byte4)?;
        Ok(self.data.f32_le()?)
    }

    pub fn read_f64(&mut self, index: u64) -> Result<f64, ParseError> {
        self.expect_tag(index, TagType::Byte8)?;
        Ok(self.data.f64_le()?)
    }

    /// Opens a sub-block and reads a length-prefixed string from it.
    pub fn read_string(&mut self, index: u64) -> Result<String, ParseError> {
        self.read_subblock(index)?;
        self.string()
    }

    pub fn read_lww_bool(&mut self, index: u64) -> Result<LwwValue<bool>, ParseError> {
        self.read_subblock(index)?;
        let timestamp = self.read_id(1)?;
        let value = self.read_bool(2)?;
        Ok(LwwValue::new(timestamp, value))
    }

    pub fn read_lww_byte(&mut self, index: u64) -> Result<LwwValue<u8>, ParseError> {
        self.read_subblock(index)?;
        let timestamp = self.read_id(1)?;
        let value = self.read_byte(2)?;
        Ok(LwwValue::new(timestamp, value))
    }

    pub fn read_lww_f32(&mut self, index: u64) -> Result<LwwValue<f32>, ParseError> {
        self.read_subblock(index)?;
        let timestamp = self.read_id(1)?;
        let value = self.read_f32(2)?;
        Ok(LwwValue::new(timestamp, value))
    }

    pub fn read_lww_id(&mut self, index: u64) -> Result<LwwValue<CrdtId>, ParseError> {
        self.read_subblock(index)?;
        let timestamp = self.read_id(1)?;
        let value = self.read_id(2)?;
        Ok(LwwValue::new(timestamp, value))
    }

    pub fn read_lww_string(&mut self, index: u64) -> Result<LwwValue<String>, ParseError> {
        self.read_subblock(index)?;
        let timestamp = self.read_id(1)?;
        let value = self.read_string(2)?;
        Ok(LwwValue::new(timestamp, value))
    }

    // Untagged reads, for the few places the format stores raw values.

    /// Reads a CRDT id: `u8` part1 followed by a varuint part2.
    pub fn crdt_id(&mut self) -> Result<CrdtId, ParseError> {
        let part1 = self.data.u8()?;
        let part2 = self.data.varuint()?;
        Ok(CrdtId { part1, part2 })
    }

    /// Reads a length-prefixed string: varuint byte length, an is-ASCII
    /// flag (ignored), then the raw bytes.
    pub fn string(&mut self) -> Result<String, ParseError> {
        let length = self.data.varuint()?;
        let _is_ascii = self.data.bool()?;
        if length == 0 {
            return Ok(String::new());
        }
        let bytes = self.data.bytes(length as usize)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.data.u8()?)
    }

    pub fn u16(&mut self) -> Result<u16, ParseError> {
        Ok(self.data.u16_le()?)
    }

    pub fn f32(&mut self) -> Result<f32, ParseError> {
        Ok(self.data.f32_le()?)
    }

    pub fn f64(&mut self) -> Result<f64, ParseError> {
        Ok(self.data.f64_le()?)
    }

    pub fn varuint(&mut self) -> Result<u64, ParseError> {
        Ok(self.data.varuint()?)
    }

    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>, ParseError> {
        Ok(self.data.bytes(n)?)
    }
}
