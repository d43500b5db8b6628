//! Text reconstruction: CRDT character sequence to styled paragraphs.
//!
//! Characters within one item carry consecutive ids starting at the item's
//! `item_id`, so any character position maps to an id by offset arithmetic.
//! Offsets into the concatenated string are counted in bytes, id offsets in
//! code points; the two advance independently for non-ASCII input.

use std::collections::HashMap;

use crate::crdt::CrdtId;
use crate::types::{ParagraphStyle, Text};

/// Y offset of the first text baseline relative to the text block origin.
pub const TEXT_TOP_Y: f64 = -88.0;

/// Vertical space one paragraph of the given style occupies, in screen
/// units.
pub fn line_height(style: ParagraphStyle) -> f64 {
    match style {
        ParagraphStyle::Heading => 150.0,
        ParagraphStyle::Bullet
        | ParagraphStyle::Bullet2
        | ParagraphStyle::Checkbox
        | ParagraphStyle::CheckboxChecked => 35.0,
        _ => 70.0,
    }
}

/// One reconstructed paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: ParagraphStyle,
    /// Id of the paragraph's first character; zero for a trailing empty
    /// paragraph past the last character.
    pub start_id: CrdtId,
}

/// The paragraphs of a text block, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDocument {
    pub paragraphs: Vec<Paragraph>,
}

/// Character-position to id resolution over the live (non-tombstone) items.
struct ItemSpans {
    /// (first character id, starting character offset, character count).
    spans: Vec<(CrdtId, usize, usize)>,
    total_chars: usize,
}

impl ItemSpans {
    fn build(text: &Text) -> (Self, String) {
        let mut concatenated = String::new();
        let mut spans = Vec::new();
        let mut char_offset = 0;
        for item in text.items.live() {
            let char_len = item.value.chars().count();
            spans.push((item.item_id, char_offset, char_len));
            char_offset += char_len;
            concatenated.push_str(&item.value);
        }
        (
            Self {
                spans,
                total_chars: char_offset,
            },
            concatenated,
        )
    }

    /// Id of the character at `char_pos`, counted in code points over the
    /// concatenated live text.
    fn id_at(&self, char_pos: usize) -> Option<CrdtId> {
        if char_pos >= self.total_chars {
            return None;
        }
        for &(item_id, start, len) in &self.spans {
            if char_pos >= start && char_pos < start + len {
                return Some(CrdtId {
                    part1: item_id.part1,
                    part2: item_id.part2 + (char_pos - start) as u64,
                });
            }
        }
        None
    }
}

/// Splits the reconstructed character stream into styled paragraphs.
///
/// Paragraph `i`'s style is owned by the newline that terminated paragraph
/// `i - 1`; the first paragraph is owned by its first character. Unstyled
/// paragraphs are `Plain`. Empty paragraphs (including a trailing one from
/// a terminal newline) are preserved, they contribute vertical spacing.
pub fn build_text_document(text: &Text) -> TextDocument {
    let (spans, full_text) = ItemSpans::build(text);
    if full_text.is_empty() {
        return TextDocument::default();
    }

    let mut paragraphs = Vec::new();
    let mut char_pos = 0usize;
    for (i, line) in full_text.split('\n').enumerate() {
        let owner = if i == 0 {
            spans.id_at(0)
        } else {
            spans.id_at(char_pos - 1)
        };
        let style = owner
            .and_then(|id| text.styles.get(&id))
            .map(|lww| lww.value)
            .unwrap_or(ParagraphStyle::Plain);
        let start_id = spans.id_at(char_pos).unwrap_or(CrdtId::ZERO);

        paragraphs.push(Paragraph {
            text: line.to_string(),
            style,
            start_id,
        });
        char_pos += line.chars().count() + 1;
    }

    TextDocument { paragraphs }
}

/// Maps every live character id to the baseline Y of the paragraph it
/// belongs to (the newline terminating a paragraph belongs to that
/// paragraph). Tombstoned characters are absent.
pub fn anchor_positions(text: &Text) -> HashMap<CrdtId, f64> {
    let (spans, _) = ItemSpans::build(text);
    let doc = build_text_document(text);

    let mut positions = HashMap::new();
    let mut y = text.pos_y + TEXT_TOP_Y;
    let mut char_pos = 0usize;
    for (i, paragraph) in doc.paragraphs.iter().enumerate() {
        y += line_height(paragraph.style);
        let mut span = paragraph.text.chars().count();
        if i + 1 < doc.paragraphs.len() {
            span += 1; // the terminating newline
        }
        for offset in 0..span {
            if let Some(id) = spans.id_at(char_pos + offset) {
                positions.insert(id, y);
            }
        }
        char_pos += span;
    }
    positions
}
