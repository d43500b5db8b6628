//! Scene model: the entities a decoded notebook page is made of.

use std::collections::HashMap;

use crate::crdt::{CrdtId, CrdtSequence, LwwValue};

/// Drawing tool of a stroke. Two generations of most tools exist with
/// distinct on-disk ids but identical rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pen {
    Paintbrush1,
    Pencil1,
    Ballpoint1,
    Marker1,
    Fineliner1,
    Highlighter1,
    Eraser,
    MechanicalPencil1,
    EraserArea,
    Paintbrush2,
    MechanicalPencil2,
    Pencil2,
    Ballpoint2,
    Marker2,
    Fineliner2,
    Highlighter2,
    Calligraphy,
    Shader,
    /// A tool id this parser does not know; rendered with defaults.
    Unknown(u32),
}

impl Pen {
    pub fn from_u32(v: u32) -> Pen {
        match v {
            0 => Pen::Paintbrush1,
            1 => Pen::Pencil1,
            2 => Pen::Ballpoint1,
            3 => Pen::Marker1,
            4 => Pen::Fineliner1,
            5 => Pen::Highlighter1,
            6 => Pen::Eraser,
            7 => Pen::MechanicalPencil1,
            8 => Pen::EraserArea,
            12 => Pen::Paintbrush2,
            13 => Pen::MechanicalPencil2,
            14 => Pen::Pencil2,
            15 => Pen::Ballpoint2,
            16 => Pen::Marker2,
            17 => Pen::Fineliner2,
            18 => Pen::Highlighter2,
            21 => Pen::Calligraphy,
            23 => Pen::Shader,
            other => Pen::Unknown(other),
        }
    }
}

/// Pen colour index. Values 14 and up are written by newer device firmware
/// for highlight/shader variants; their exact shade usually arrives as an
/// RGBA override on the stroke instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenColor {
    Black,
    Gray,
    White,
    Yellow,
    Green,
    Pink,
    Blue,
    Red,
    GrayOverlap,
    Highlight,
    Green2,
    Cyan,
    Magenta,
    Yellow2,
    HighlightYellow,
    HighlightBlue,
    HighlightPink,
    HighlightOrange,
    HighlightGreen,
    HighlightGray,
    ShaderGray,
    ShaderOrange,
    ShaderMagenta,
    ShaderBlue,
    ShaderRed,
    ShaderGreen,
    ShaderYellow,
    ShaderCyan,
    Unknown(u32),
}

impl PenColor {
    pub fn from_u32(v: u32) -> PenColor {
        match v {
            0 => PenColor::Black,
            1 => PenColor::Gray,
            2 => PenColor::White,
            3 => PenColor::Yellow,
            4 => PenColor::Green,
            5 => PenColor::Pink,
            6 => PenColor::Blue,
            7 => PenColor::Red,
            8 => PenColor::GrayOverlap,
            9 => PenColor::Highlight,
            10 => PenColor::Green2,
            11 => PenColor::Cyan,
            12 => PenColor::Magenta,
            13 => PenColor::Yellow2,
            14 => PenColor::HighlightYellow,
            15 => PenColor::HighlightBlue,
            16 => PenColor::HighlightPink,
            17 => PenColor::HighlightOrange,
            18 => PenColor::HighlightGreen,
            19 => PenColor::HighlightGray,
            20 => PenColor::ShaderGray,
            21 => PenColor::ShaderOrange,
            22 => PenColor::ShaderMagenta,
            23 => PenColor::ShaderBlue,
            24 => PenColor::ShaderRed,
            25 => PenColor::ShaderGreen,
            26 => PenColor::ShaderYellow,
            27 => PenColor::ShaderCyan,
            other => PenColor::Unknown(other),
        }
    }
}

/// An RGBA colour as stored in a stroke's override tail (file order BGRA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Maps an override colour back to the palette entry it names, if any.
/// Alpha is ignored; the device varies it per highlight shade.
pub fn pen_color_for_rgb(r: u8, g: u8, b: u8) -> Option<PenColor> {
    match (r, g, b) {
        (0, 0, 0) => Some(PenColor::Black),
        (144, 144, 144) => Some(PenColor::Gray),
        (255, 255, 255) => Some(PenColor::White),
        (251, 247, 25) => Some(PenColor::Yellow),
        (0, 255, 0) => Some(PenColor::Green),
        (255, 192, 203) => Some(PenColor::Pink),
        (78, 105, 201) => Some(PenColor::Blue),
        (179, 62, 57) => Some(PenColor::Red),
        (125, 125, 125) => Some(PenColor::GrayOverlap),
        (255, 237, 117) => Some(PenColor::Highlight),
        (161, 216, 125) => Some(PenColor::Green2),
        (139, 208, 229) => Some(PenColor::Cyan),
        (183, 130, 205) => Some(PenColor::Magenta),
        (247, 232, 81) => Some(PenColor::Yellow2),
        _ => None,
    }
}

/// Style of one text paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Basic,
    Plain,
    Heading,
    Bold,
    Bullet,
    Bullet2,
    Checkbox,
    CheckboxChecked,
    Numbered,
    Unknown(u8),
}

impl ParagraphStyle {
    pub fn from_u8(v: u8) -> ParagraphStyle {
        match v {
            0 => ParagraphStyle::Basic,
            1 => ParagraphStyle::Plain,
            2 => ParagraphStyle::Heading,
            3 => ParagraphStyle::Bold,
            4 => ParagraphStyle::Bullet,
            5 => ParagraphStyle::Bullet2,
            6 => ParagraphStyle::Checkbox,
            7 => ParagraphStyle::CheckboxChecked,
            10 => ParagraphStyle::Numbered,
            other => ParagraphStyle::Unknown(other),
        }
    }
}

/// One sampled pen position within a stroke.
///
/// Whatever the on-disk encoding version, points are held in the compact
/// representation: `speed`/`width` pre-multiplied by 4, `direction` mapped
/// to 0..=255 over a full turn, `pressure` to 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub speed: u16,
    pub width: u16,
    pub direction: u8,
    pub pressure: u8,
}

/// A drawn stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub color: PenColor,
    /// Exact colour from the file's BGRA tail, when present. Takes
    /// precedence over the palette during rendering.
    pub color_override: Option<Rgba>,
    pub tool: Pen,
    pub points: Vec<Point>,
    pub thickness_scale: f64,
    pub starting_length: f32,
    pub move_id: Option<CrdtId>,
}

/// A text block: a CRDT character sequence plus per-paragraph styling.
///
/// `items` holds strings whose characters carry consecutive ids starting at
/// the item's `item_id`. `styles` is keyed by the id of the character that
/// ends a paragraph (its newline), except the first paragraph which is
/// keyed by the id of its first character.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub items: CrdtSequence<String>,
    pub styles: HashMap<CrdtId, LwwValue<ParagraphStyle>>,
    pub pos_x: f64,
    pub pos_y: f64,
    pub width: f32,
}

/// A child of a group. Child groups are stored by id and resolved through
/// the scene's node arena; strokes and text are owned inline.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Group(CrdtId),
    Line(Line),
    Text(Text),
}

/// A layer or sub-group of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub node_id: CrdtId,
    pub children: CrdtSequence<SceneItem>,
    pub label: LwwValue<String>,
    pub visible: LwwValue<bool>,
    pub anchor_id: Option<LwwValue<CrdtId>>,
    pub anchor_type: Option<LwwValue<u8>>,
    pub anchor_threshold: Option<LwwValue<f32>>,
    pub anchor_origin_x: Option<LwwValue<f32>>,
}

impl Group {
    pub fn new(node_id: CrdtId) -> Self {
        Self {
            node_id,
            children: CrdtSequence::new(),
            label: LwwValue::initial(String::new()),
            visible: LwwValue::initial(true),
            anchor_id: None,
            anchor_type: None,
            anchor_threshold: None,
            anchor_origin_x: None,
        }
    }
}
