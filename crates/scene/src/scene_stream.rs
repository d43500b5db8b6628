//! Scene decoder: turns the block stream into a [`SceneTree`].
//!
//! Blocks arrive in file order and may reference nodes that have not been
//! declared yet, so groups are created on demand in an arena keyed by id.
//! A malformed or unknown block is logged and skipped; the surrounding
//! framing guarantees the stream resynchronises at the next block header.

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, warn};

use crate::crdt::{CrdtId, CrdtSequence, CrdtSequenceItem};
use crate::tagged_reader::TaggedBlockReader;
use crate::types::{
    pen_color_for_rgb, Group, Line, ParagraphStyle, Pen, PenColor, Point, Rgba, SceneItem, Text,
};
use crate::{LwwValue, ParseError, TagType};

pub const BLOCK_MIGRATION_INFO: u8 = 0x00;
pub const BLOCK_SCENE_TREE: u8 = 0x01;
pub const BLOCK_TREE_NODE: u8 = 0x02;
pub const BLOCK_SCENE_GLYPH_ITEM: u8 = 0x03;
pub const BLOCK_SCENE_GROUP_ITEM: u8 = 0x04;
pub const BLOCK_SCENE_LINE_ITEM: u8 = 0x05;
pub const BLOCK_SCENE_TEXT_ITEM: u8 = 0x06;
pub const BLOCK_ROOT_TEXT: u8 = 0x07;
pub const BLOCK_SCENE_TOMBSTONE: u8 = 0x08;
pub const BLOCK_AUTHOR_IDS: u8 = 0x09;
pub const BLOCK_PAGE_INFO: u8 = 0x0A;
pub const BLOCK_SCENE_INFO: u8 = 0x0D;

/// On-disk size of one point in the legacy encoding (block version 1).
const POINT_SIZE_V1: u32 = 24;
/// On-disk size of one point in the compact encoding.
const POINT_SIZE_V2: u32 = 14;

/// A decoded notebook page.
///
/// Groups live in the `nodes` arena and reference each other by id, which
/// sidesteps ownership cycles a hostile file could otherwise create. The
/// root group always exists under id `(0, 1)`.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    pub root_id: CrdtId,
    pub root_text: Option<Text>,
    pub nodes: HashMap<CrdtId, Group>,
}

impl SceneTree {
    pub fn new() -> Self {
        let root_id = CrdtId::new(0, 1);
        let mut nodes = HashMap::new();
        nodes.insert(root_id, Group::new(root_id));
        Self {
            root_id,
            root_text: None,
            nodes,
        }
    }

    pub fn root(&self) -> Option<&Group> {
        self.nodes.get(&self.root_id)
    }

    pub fn node(&self, id: CrdtId) -> Option<&Group> {
        self.nodes.get(&id)
    }

    fn ensure_node(&mut self, id: CrdtId) -> &mut Group {
        self.nodes.entry(id).or_insert_with(|| Group::new(id))
    }
}

/// Parses a complete `.rm` stream into a scene tree.
///
/// Fatal conditions are a bad header and truncation between blocks; any
/// error inside a block payload only discards that block.
pub fn read_scene_tree<R: Read>(input: R) -> Result<SceneTree, ParseError> {
    let mut reader = TaggedBlockReader::new(input);
    reader.read_header()?;

    let mut tree = SceneTree::new();
    loop {
        let info = match reader.read_block()? {
            Some(info) => info,
            None => break,
        };
        if let Err(err) = process_block(&mut tree, &mut reader, info.block_type, info.current_version)
        {
            warn!(block_type = info.block_type, error = %err, "skipping malformed block");
        }
        if let Err(err) = reader.end_block() {
            warn!(error = %err, "input ended inside a block, stopping");
            break;
        }
    }
    Ok(tree)
}

fn process_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
    block_type: u8,
    version: u8,
) -> Result<(), ParseError> {
    match block_type {
        BLOCK_SCENE_TREE => read_scene_tree_block(tree, reader),
        BLOCK_TREE_NODE => read_tree_node_block(tree, reader),
        BLOCK_SCENE_GROUP_ITEM => read_group_item_block(tree, reader),
        BLOCK_SCENE_LINE_ITEM => read_line_item_block(tree, reader, version),
        BLOCK_ROOT_TEXT => read_root_text_block(tree, reader),
        BLOCK_MIGRATION_INFO | BLOCK_SCENE_GLYPH_ITEM | BLOCK_SCENE_TEXT_ITEM
        | BLOCK_SCENE_TOMBSTONE | BLOCK_AUTHOR_IDS | BLOCK_PAGE_INFO | BLOCK_SCENE_INFO => Ok(()),
        other => {
            debug!(block_type = other, "skipping unknown block type");
            Ok(())
        }
    }
}

fn read_scene_tree_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
) -> Result<(), ParseError> {
    let tree_id = reader.read_id(1)?;
    let _node_id = reader.read_id(2)?;
    let _is_update = reader.read_bool(3)?;
    reader.read_subblock(4)?;
    let parent_id = reader.read_id(1)?;

    if tree_id == parent_id {
        warn!(id = %tree_id, "node declared as its own parent, ignoring");
        return Ok(());
    }

    tree.ensure_node(tree_id);
    tree.ensure_node(parent_id).children.push(CrdtSequenceItem {
        item_id: tree_id,
        left_id: CrdtId::ZERO,
        right_id: CrdtId::ZERO,
        deleted_length: 0,
        value: SceneItem::Group(tree_id),
    });
    Ok(())
}

fn read_tree_node_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
) -> Result<(), ParseError> {
    let node_id = reader.read_id(1)?;
    let label = reader.read_lww_string(2)?;
    let visible = reader.read_lww_bool(3)?;

    let anchor = if reader.has_subblock(7) {
        let anchor_id = reader.read_lww_id(7)?;
        let anchor_type = reader.read_lww_byte(8)?;
        let anchor_threshold = reader.read_lww_f32(9)?;
        let anchor_origin_x = reader.read_lww_f32(10)?;
        Some((anchor_id, anchor_type, anchor_threshold, anchor_origin_x))
    } else {
        None
    };

    let node = tree.ensure_node(node_id);
    node.label = label;
    node.visible = visible;
    if let Some((id, ty, threshold, origin_x)) = anchor {
        node.anchor_id = Some(id);
        node.anchor_type = Some(ty);
        node.anchor_threshold = Some(threshold);
        node.anchor_origin_x = Some(origin_x);
    }
    Ok(())
}

/// Reads the five CRDT item fields shared by group and line item blocks.
fn read_item_header<R: Read>(
    reader: &mut TaggedBlockReader<R>,
) -> Result<(CrdtId, CrdtId, CrdtId, CrdtId, u32), ParseError> {
    let parent_id = reader.read_id(1)?;
    let item_id = reader.read_id(2)?;
    let left_id = reader.read_id(3)?;
    let right_id = reader.read_id(4)?;
    let deleted_length = reader.read_u32(5)?;
    Ok((parent_id, item_id, left_id, right_id, deleted_length))
}

fn read_group_item_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
) -> Result<(), ParseError> {
    let (parent_id, item_id, left_id, right_id, deleted_length) = read_item_header(reader)?;

    let mut node_id = None;
    if reader.has_subblock(6) {
        reader.read_subblock(6)?;
        let _item_type = reader.u8()?; // 0x02 for groups; not enforced
        node_id = Some(reader.read_id(2)?);
    }
    let Some(node_id) = node_id else {
        return Ok(());
    };

    tree.ensure_node(node_id);
    tree.ensure_node(parent_id).children.push(CrdtSequenceItem {
        item_id,
        left_id,
        right_id,
        deleted_length,
        value: SceneItem::Group(node_id),
    });
    Ok(())
}

fn read_line_item_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
    version: u8,
) -> Result<(), ParseError> {
    let (parent_id, item_id, left_id, right_id, deleted_length) = read_item_header(reader)?;

    let mut line = None;
    if reader.has_subblock(6) {
        reader.read_subblock(6)?;
        let _item_type = reader.u8()?; // 0x03 for lines; not enforced
        line = Some(read_line(reader, version)?);
    }
    let Some(line) = line else {
        return Ok(());
    };

    tree.ensure_node(parent_id).children.push(CrdtSequenceItem {
        item_id,
        left_id,
        right_id,
        deleted_length,
        value: SceneItem::Line(line),
    });
    Ok(())
}

fn read_line<R: Read>(reader: &mut TaggedBlockReader<R>, version: u8) -> Result<Line, ParseError> {
    let tool_id = reader.read_u32(1)?;
    let color_id = reader.read_u32(2)?;
    let thickness_scale = reader.read_f64(3)?;
    let starting_length = reader.read_f32(4)?;

    let points_len = reader.read_subblock(5)?;
    let point_size = if version == 1 {
        POINT_SIZE_V1
    } else {
        POINT_SIZE_V2
    };
    let num_points = points_len / point_size;
    let extra = points_len % point_size;

    let mut points = Vec::with_capacity(num_points as usize);
    for _ in 0..num_points {
        points.push(read_point(reader, version)?);
    }
    if extra > 0 {
        debug!(extra, "trailing bytes in points sub-block");
        reader.bytes(extra as usize)?;
    }

    let _timestamp = reader.read_id(6)?;

    let mut move_id = None;
    if reader.peek_tag(7, TagType::Id) {
        move_id = Some(reader.read_id(7)?);
    }

    // Newer firmware appends the exact stroke colour: two prefix bytes then
    // BGRA. A colour the palette knows rewrites the enum; the raw value is
    // kept either way for rendering.
    let mut color = PenColor::from_u32(color_id);
    let mut color_override = None;
    if reader.remaining_in_block() >= 6 {
        reader.bytes(2)?;
        let b = reader.u8()?;
        let g = reader.u8()?;
        let r = reader.u8()?;
        let a = reader.u8()?;
        color_override = Some(Rgba { r, g, b, a });
        if let Some(mapped) = pen_color_for_rgb(r, g, b) {
            color = mapped;
        }
    }

    Ok(Line {
        color,
        color_override,
        tool: Pen::from_u32(tool_id),
        points,
        thickness_scale,
        starting_length,
        move_id,
    })
}

fn read_point<R: Read>(reader: &mut TaggedBlockReader<R>, version: u8) -> Result<Point, ParseError> {
    let x = reader.f32()?;
    let y = reader.f32()?;

    let (speed, width, direction, pressure) = if version == 1 {
        let speed = reader.f32()?;
        let direction = reader.f32()?;
        let width = reader.f32()?;
        let pressure = reader.f32()?;
        (
            (speed * 4.0) as u16,
            (width * 4.0) as u16,
            (255.0 * direction / (std::f32::consts::PI * 2.0)) as u8,
            (pressure * 255.0) as u8,
        )
    } else {
        let speed = reader.u16()?;
        let width = reader.u16()?;
        let direction = reader.u8()?;
        let pressure = reader.u8()?;
        (speed, width, direction, pressure)
    };

    Ok(Point {
        x,
        y,
        speed,
        width,
        direction,
        pressure,
    })
}

fn read_root_text_block<R: Read>(
    tree: &mut SceneTree,
    reader: &mut TaggedBlockReader<R>,
) -> Result<(), ParseError> {
    let _block_id = reader.read_id(1)?;

    reader.read_subblock(2)?;

    // Character items.
    reader.read_subblock(1)?;
    reader.read_subblock(1)?;
    let num_items = reader.varuint()?;
    let mut items = CrdtSequence::new();
    for _ in 0..num_items {
        items.push(read_text_item(reader)?);
    }

    // Paragraph formatting.
    reader.read_subblock(2)?;
    reader.read_subblock(1)?;
    let num_formats = reader.varuint()?;
    let mut styles: HashMap<CrdtId, LwwValue<ParagraphStyle>> = HashMap::new();
    for _ in 0..num_formats {
        let (char_id, style) = read_text_format(reader)?;
        match styles.get(&char_id) {
            Some(existing) if existing.timestamp > style.timestamp => {}
            _ => {
                styles.insert(char_id, style);
            }
        }
    }

    // Position and width.
    reader.read_subblock(3)?;
    let pos_x = reader.f64()?;
    let pos_y = reader.f64()?;
    let width = reader.read_f32(4)?;

    tree.root_text = Some(Text {
        items,
        styles,
        pos_x,
        pos_y,
        width,
    });
    Ok(())
}

fn read_text_item<R: Read>(
    reader: &mut TaggedBlockReader<R>,
) -> Result<CrdtSequenceItem<String>, ParseError> {
    reader.read_subblock(0)?;
    let item_id = reader.read_id(2)?;
    let left_id = reader.read_id(3)?;
    let right_id = reader.read_id(4)?;
    let deleted_length = reader.read_u32(5)?;
    let value = if reader.has_subblock(6) {
        reader.read_string(6)?
    } else {
        String::new()
    };
    Ok(CrdtSequenceItem {
        item_id,
        left_id,
        right_id,
        deleted_length,
        value,
    })
}

fn read_text_format<R: Read>(
    reader: &mut TaggedBlockReader<R>,
) -> Result<(CrdtId, LwwValue<ParagraphStyle>), ParseError> {
    let char_id = reader.crdt_id()?;
    let timestamp = reader.read_id(1)?;
    reader.read_subblock(2)?;
    let _reserved = reader.u8()?; // 17 in every known file
    let format_code = reader.u8()?;
    Ok((
        char_id,
        LwwValue::new(timestamp, ParagraphStyle::from_u8(format_code)),
    ))
}
