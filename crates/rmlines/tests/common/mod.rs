//! Builders for synthetic `.rm` fixtures used by the integration tests.

use rmlines_buffers::Writer;
use rmlines_scene::tagged_reader::HEADER_V6;
use rmlines_scene::{CrdtId, TagType};

pub fn tag(index: u64, tag_type: TagType) -> Vec<u8> {
    let mut w = Writer::new();
    w.varuint((index << 4) | tag_type.nibble() as u64);
    w.into_bytes()
}

pub fn tagged_id(index: u64, id: CrdtId) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Id));
    w.u8(id.part1);
    w.varuint(id.part2);
    w.into_bytes()
}

pub fn tagged_bool(index: u64, v: bool) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Byte1));
    w.bool(v);
    w.into_bytes()
}

pub fn tagged_byte(index: u64, v: u8) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Byte1));
    w.u8(v);
    w.into_bytes()
}

pub fn tagged_u32(index: u64, v: u32) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Byte4));
    w.u32_le(v);
    w.into_bytes()
}

pub fn tagged_f32(index: u64, v: f32) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Byte4));
    w.f32_le(v);
    w.into_bytes()
}

pub fn tagged_f64(index: u64, v: f64) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Byte8));
    w.f64_le(v);
    w.into_bytes()
}

pub fn subblock(index: u64, payload: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tag(index, TagType::Length4));
    w.u32_le(payload.len() as u32);
    w.bytes(payload);
    w.into_bytes()
}

pub fn string_value(value: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.varuint(value.len() as u64);
    w.bool(value.is_ascii());
    w.bytes(value.as_bytes());
    w.into_bytes()
}

pub fn lww_string(index: u64, timestamp: CrdtId, value: &str) -> Vec<u8> {
    let mut inner = Writer::new();
    inner.bytes(&tagged_id(1, timestamp));
    inner.bytes(&subblock(2, &string_value(value)));
    subblock(index, &inner.into_bytes())
}

pub fn lww_bool(index: u64, timestamp: CrdtId, value: bool) -> Vec<u8> {
    let mut inner = Writer::new();
    inner.bytes(&tagged_id(1, timestamp));
    inner.bytes(&tagged_bool(2, value));
    subblock(index, &inner.into_bytes())
}

pub fn lww_byte(index: u64, timestamp: CrdtId, value: u8) -> Vec<u8> {
    let mut inner = Writer::new();
    inner.bytes(&tagged_id(1, timestamp));
    inner.bytes(&tagged_byte(2, value));
    subblock(index, &inner.into_bytes())
}

pub fn lww_f32(index: u64, timestamp: CrdtId, value: f32) -> Vec<u8> {
    let mut inner = Writer::new();
    inner.bytes(&tagged_id(1, timestamp));
    inner.bytes(&tagged_f32(2, value));
    subblock(index, &inner.into_bytes())
}

pub fn lww_id(index: u64, timestamp: CrdtId, value: CrdtId) -> Vec<u8> {
    let mut inner = Writer::new();
    inner.bytes(&tagged_id(1, timestamp));
    inner.bytes(&tagged_id(2, value));
    subblock(index, &inner.into_bytes())
}

pub fn block(block_type: u8, version: u8, payload: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.u32_le(payload.len() as u32);
    w.u8(0);
    w.u8(version);
    w.u8(version);
    w.u8(block_type);
    w.bytes(payload);
    w.into_bytes()
}

pub fn file(blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut data = HEADER_V6.to_vec();
    for b in blocks {
        data.extend_from_slice(b);
    }
    data
}

pub fn scene_tree_block(tree_id: CrdtId, parent_id: CrdtId) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tagged_id(1, tree_id));
    w.bytes(&tagged_id(2, CrdtId::new(0, 0)));
    w.bytes(&tagged_bool(3, false));
    w.bytes(&subblock(4, &tagged_id(1, parent_id)));
    block(0x01, 1, &w.into_bytes())
}

pub fn tree_node_block(node_id: CrdtId, label: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tagged_id(1, node_id));
    w.bytes(&lww_string(2, CrdtId::new(0, 40), label));
    w.bytes(&lww_bool(3, CrdtId::new(0, 41), true));
    block(0x02, 1, &w.into_bytes())
}

/// A tree node carrying the anchor quadruple.
pub fn anchored_tree_node_block(
    node_id: CrdtId,
    anchor_id: CrdtId,
    anchor_origin_x: f32,
) -> Vec<u8> {
    let ts = CrdtId::new(0, 40);
    let mut w = Writer::new();
    w.bytes(&tagged_id(1, node_id));
    w.bytes(&lww_string(2, ts, ""));
    w.bytes(&lww_bool(3, ts, true));
    w.bytes(&lww_id(7, ts, anchor_id));
    w.bytes(&lww_byte(8, ts, 2));
    w.bytes(&lww_f32(9, ts, 0.0));
    w.bytes(&lww_f32(10, ts, anchor_origin_x));
    block(0x02, 1, &w.into_bytes())
}

pub fn item_header(parent: CrdtId, item: CrdtId) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tagged_id(1, parent));
    w.bytes(&tagged_id(2, item));
    w.bytes(&tagged_id(3, CrdtId::new(0, 0)));
    w.bytes(&tagged_id(4, CrdtId::new(0, 0)));
    w.bytes(&tagged_u32(5, 0));
    w.into_bytes()
}

/// A compact-encoding point: `(x, y, speed, width, direction, pressure)`.
pub type PointSpec = (f32, f32, u16, u16, u8, u8);

pub fn line_item_block(
    parent: CrdtId,
    item: CrdtId,
    tool: u32,
    color: u32,
    thickness: f64,
    points: &[PointSpec],
) -> Vec<u8> {
    let mut body = Writer::new();
    body.u8(0x03);
    body.bytes(&tagged_u32(1, tool));
    body.bytes(&tagged_u32(2, color));
    body.bytes(&tagged_f64(3, thickness));
    body.bytes(&tagged_f32(4, 0.0));
    let mut pts = Writer::new();
    for &(x, y, speed, width, direction, pressure) in points {
        pts.f32_le(x);
        pts.f32_le(y);
        pts.u16_le(speed);
        pts.u16_le(width);
        pts.u8(direction);
        pts.u8(pressure);
    }
    body.bytes(&subblock(5, &pts.into_bytes()));
    body.bytes(&tagged_id(6, CrdtId::new(0, 99)));

    let mut w = Writer::new();
    w.bytes(&item_header(parent, item));
    w.bytes(&subblock(6, &body.into_bytes()));
    block(0x05, 2, &w.into_bytes())
}

pub fn text_item(item_id: CrdtId, deleted: u32, value: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&tagged_id(2, item_id));
    w.bytes(&tagged_id(3, CrdtId::new(0, 0)));
    w.bytes(&tagged_id(4, CrdtId::new(0, 0)));
    w.bytes(&tagged_u32(5, deleted));
    if !value.is_empty() {
        w.bytes(&subblock(6, &string_value(value)));
    }
    subblock(0, &w.into_bytes())
}

pub fn text_format(char_id: CrdtId, timestamp: CrdtId, code: u8) -> Vec<u8> {
    let mut w = Writer::new();
    w.u8(char_id.part1);
    w.varuint(char_id.part2);
    w.bytes(&tagged_id(1, timestamp));
    w.bytes(&subblock(2, &[17, code]));
    w.into_bytes()
}

pub fn root_text_block(
    items: &[Vec<u8>],
    formats: &[Vec<u8>],
    pos: (f64, f64),
    width: f32,
) -> Vec<u8> {
    let mut item_list = Writer::new();
    item_list.varuint(items.len() as u64);
    for i in items {
        item_list.bytes(i);
    }
    let items_outer = subblock(1, &subblock(1, &item_list.into_bytes()));

    let mut fmt_list = Writer::new();
    fmt_list.varuint(formats.len() as u64);
    for f in formats {
        fmt_list.bytes(f);
    }
    let formats_outer = subblock(2, &subblock(1, &fmt_list.into_bytes()));

    let mut container = Writer::new();
    container.bytes(&items_outer);
    container.bytes(&formats_outer);

    let mut w = Writer::new();
    w.bytes(&tagged_id(1, CrdtId::new(0, 0)));
    w.bytes(&subblock(2, &container.into_bytes()));
    let mut posbuf = Writer::new();
    posbuf.f64_le(pos.0);
    posbuf.f64_le(pos.1);
    w.bytes(&subblock(3, &posbuf.into_bytes()));
    w.bytes(&tagged_f32(4, width));
    block(0x07, 1, &w.into_bytes())
}
