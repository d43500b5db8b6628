//! SVG emission: walks the scene tree and writes the vector document.

use std::collections::{HashMap, HashSet};

use rmlines_scene::text::{anchor_positions, line_height};
use rmlines_scene::{
    build_text_document, CrdtId, Group, Line, ParagraphStyle, SceneItem, SceneTree, Text,
    TEXT_TOP_Y,
};

use crate::pen::PenProfile;
use crate::RenderError;

/// reMarkable screen width in internal units.
pub const SCREEN_WIDTH: f64 = 1404.0;
/// reMarkable screen height in internal units.
pub const SCREEN_HEIGHT: f64 = 1872.0;
/// reMarkable screen density.
pub const SCREEN_DPI: f64 = 226.0;
/// Internal units to output points.
pub const SCALE: f64 = 72.0 / SCREEN_DPI;

/// Y position assigned to the two reserved anchor ids the device uses for
/// page-relative anchoring.
const SPECIAL_ANCHOR_Y: f64 = 100.0;
const SPECIAL_ANCHOR_ID_1: u64 = (1 << 48) - 2;
const SPECIAL_ANCHOR_ID_2: u64 = (1 << 48) - 1;

fn scale(v: f64) -> f64 {
    v * SCALE
}

/// Renders a scene tree to a complete SVG document.
///
/// Rendering the same tree twice produces identical bytes; the walk is
/// deterministic and touches no external state.
pub fn render_svg(tree: &SceneTree) -> Result<String, RenderError> {
    let root = tree.root().ok_or(RenderError::MissingRoot)?;

    let anchor_pos = build_anchor_pos(tree.root_text.as_ref());
    let (mut x_min, mut x_max, mut y_min, mut y_max) =
        bounding_box(tree, root, &anchor_pos, &mut HashSet::new());
    if let Some(text) = &tree.root_text {
        let (tx_min, tx_max, ty_min, ty_max) = text_extent(text);
        x_min = x_min.min(tx_min);
        x_max = x_max.max(tx_max);
        y_min = y_min.min(ty_min);
        y_max = y_max.max(ty_max);
    }

    let width = scale(x_max - x_min + 1.0);
    let height = scale(y_max - y_min + 1.0);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" height=\"{:.1}\" width=\"{:.1}\" viewBox=\"{:.1} {:.1} {:.1} {:.1}\">\n",
        height,
        width,
        scale(x_min),
        scale(y_min),
        width,
        height
    ));
    out.push_str("\t<g id=\"p1\" style=\"display:inline\">\n");

    if let Some(text) = &tree.root_text {
        draw_text(text, &mut out, "\t\t");
    }
    draw_group(tree, root, &mut out, &anchor_pos, "\t\t", &mut HashSet::new());

    out.push_str("\t</g>\n");
    out.push_str("</svg>\n");
    Ok(out)
}

/// Anchor id to Y position: the two reserved page anchors plus every live
/// character of the root text.
fn build_anchor_pos(root_text: Option<&Text>) -> HashMap<CrdtId, f64> {
    let mut map = HashMap::new();
    map.insert(CrdtId::new(0, SPECIAL_ANCHOR_ID_1), SPECIAL_ANCHOR_Y);
    map.insert(CrdtId::new(0, SPECIAL_ANCHOR_ID_2), SPECIAL_ANCHOR_Y);
    if let Some(text) = root_text {
        map.extend(anchor_positions(text));
    }
    map
}

/// Resolved translation of a group: horizontal origin plus the Y of the
/// character it is anchored to (0 when the target is unknown).
fn group_anchor(group: &Group, anchor_pos: &HashMap<CrdtId, f64>) -> (f64, f64) {
    match (&group.anchor_id, &group.anchor_origin_x) {
        (Some(id), Some(origin_x)) => {
            let y = anchor_pos.get(&id.value).copied().unwrap_or(0.0);
            (origin_x.value as f64, y)
        }
        _ => (0.0, 0.0),
    }
}

/// Bounding box of a group's content in internal units, anchored children
/// offset by their resolved anchors. Starts from the full screen so an
/// empty page still renders page-sized.
fn bounding_box(
    tree: &SceneTree,
    group: &Group,
    anchor_pos: &HashMap<CrdtId, f64>,
    visiting: &mut HashSet<CrdtId>,
) -> (f64, f64, f64, f64) {
    let mut x_min = -SCREEN_WIDTH / 2.0;
    let mut x_max = SCREEN_WIDTH / 2.0;
    let mut y_min = 0.0f64;
    let mut y_max = SCREEN_HEIGHT;

    if !visiting.insert(group.node_id) {
        return (x_min, x_max, y_min, y_max);
    }

    for item in &group.children {
        match &item.value {
            SceneItem::Group(id) => {
                let Some(child) = tree.node(*id) else { continue };
                let (ax, ay) = group_anchor(child, anchor_pos);
                let (cx_min, cx_max, cy_min, cy_max) =
                    bounding_box(tree, child, anchor_pos, visiting);
                x_min = x_min.min(cx_min + ax);
                x_max = x_max.max(cx_max + ax);
                y_min = y_min.min(cy_min + ay);
                y_max = y_max.max(cy_max + ay);
            }
            SceneItem::Line(line) => {
                for p in &line.points {
                    x_min = x_min.min(p.x as f64);
                    x_max = x_max.max(p.x as f64);
                    y_min = y_min.min(p.y as f64);
                    y_max = y_max.max(p.y as f64);
                }
            }
            SceneItem::Text(text) => {
                let (tx_min, tx_max, ty_min, ty_max) = text_extent(text);
                x_min = x_min.min(tx_min);
                x_max = x_max.max(tx_max);
                y_min = y_min.min(ty_min);
                y_max = y_max.max(ty_max);
            }
        }
    }

    visiting.remove(&group.node_id);
    (x_min, x_max, y_min, y_max)
}

/// Horizontal span of a text block and the vertical range from its top
/// offset to the baseline of its last paragraph.
fn text_extent(text: &Text) -> (f64, f64, f64, f64) {
    let doc = build_text_document(text);
    let mut y = text.pos_y + TEXT_TOP_Y;
    for paragraph in &doc.paragraphs {
        y += line_height(paragraph.style);
    }
    (
        text.pos_x,
        text.pos_x + text.width as f64,
        text.pos_y + TEXT_TOP_Y,
        y,
    )
}

fn draw_group(
    tree: &SceneTree,
    group: &Group,
    out: &mut String,
    anchor_pos: &HashMap<CrdtId, f64>,
    indent: &str,
    visiting: &mut HashSet<CrdtId>,
) {
    if !visiting.insert(group.node_id) {
        return;
    }

    let (ax, ay) = group_anchor(group, anchor_pos);
    out.push_str(&format!(
        "{indent}<g id=\"{}\" transform=\"translate({:.3}, {:.3})\">\n",
        group.node_id,
        scale(ax),
        scale(ay)
    ));

    let child_indent = format!("{indent}\t");
    for item in &group.children {
        match &item.value {
            SceneItem::Group(id) => {
                if let Some(child) = tree.node(*id) {
                    draw_group(tree, child, out, anchor_pos, &child_indent, visiting);
                }
            }
            SceneItem::Line(line) => draw_stroke(line, out, &child_indent),
            SceneItem::Text(text) => draw_text(text, out, &child_indent),
        }
    }

    out.push_str(&format!("{indent}</g>\n"));
    visiting.remove(&group.node_id);
}

/// Emits a stroke as one polyline per segment. Each polyline repeats the
/// previous segment's last point so joints have no gaps.
fn draw_stroke(line: &Line, out: &mut String, indent: &str) {
    if line.points.is_empty() {
        return;
    }
    let pen = PenProfile::new(
        line.tool,
        line.color,
        line.color_override,
        line.thickness_scale,
    );

    let mut last_pos: Option<(f64, f64)> = None;
    let mut last_width = 0.0;

    for (i, point) in line.points.iter().enumerate() {
        let x = point.x as f64;
        let y = point.y as f64;

        if i % pen.segment_length == 0 {
            if last_pos.is_some() {
                out.push_str("\"/>\n");
            }

            let color = pen.segment_color(point);
            let width = pen.segment_width(point, last_width);
            let opacity = pen.segment_opacity(point);

            out.push_str(&format!(
                "{indent}<polyline style=\"fill:none; stroke:rgb({},{},{}); stroke-width:{:.3}; opacity:{:.3}\" stroke-linecap=\"{}\" points=\"",
                color.r,
                color.g,
                color.b,
                scale(width),
                opacity,
                pen.stroke_linecap
            ));
            if let Some((lx, ly)) = last_pos {
                out.push_str(&format!("{:.3},{:.3} ", scale(lx), scale(ly)));
            }
            last_width = width;
        }

        last_pos = Some((x, y));
        out.push_str(&format!("{:.3},{:.3} ", scale(x), scale(y)));
    }

    out.push_str("\" />\n");
}

fn draw_text(text: &Text, out: &mut String, indent: &str) {
    let doc = build_text_document(text);

    out.push_str(&format!(
        "{indent}<g class=\"root-text\" style=\"display:inline\">\n"
    ));
    write_text_styles(out, &format!("{indent}\t"));

    let mut y_offset = TEXT_TOP_Y;
    for paragraph in &doc.paragraphs {
        y_offset += line_height(paragraph.style);
        // Empty paragraphs still advance the offset; they are spacing only.
        if paragraph.text.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{indent}\t<text x=\"{:.3}\" y=\"{:.3}\" class=\"{}\">{}</text>\n",
            scale(text.pos_x),
            scale(text.pos_y + y_offset),
            css_class(paragraph.style),
            escape_xml(&paragraph.text)
        ));
    }

    out.push_str(&format!("{indent}</g>\n"));
}

fn write_text_styles(out: &mut String, indent: &str) {
    out.push_str(&format!("{indent}<style>\n"));
    out.push_str(&format!("{indent}\ttext.heading {{ font: 14pt serif; }}\n"));
    out.push_str(&format!(
        "{indent}\ttext.bold {{ font: 8pt sans-serif; font-weight: bold; }}\n"
    ));
    out.push_str(&format!(
        "{indent}\ttext, text.plain {{ font: 7pt sans-serif; }}\n"
    ));
    out.push_str(&format!("{indent}\ttext.bullet {{ font: 7pt sans-serif; }}\n"));
    out.push_str(&format!(
        "{indent}\ttext.bullet2 {{ font: 7pt sans-serif; }}\n"
    ));
    out.push_str(&format!(
        "{indent}\ttext.checkbox {{ font: 7pt sans-serif; }}\n"
    ));
    out.push_str(&format!(
        "{indent}\ttext.checkbox-checked {{ font: 7pt sans-serif; }}\n"
    ));
    out.push_str(&format!("{indent}</style>\n"));
}

fn css_class(style: ParagraphStyle) -> &'static str {
    match style {
        ParagraphStyle::Heading => "heading",
        ParagraphStyle::Bold => "bold",
        ParagraphStyle::Bullet => "bullet",
        ParagraphStyle::Bullet2 => "bullet2",
        ParagraphStyle::Checkbox => "checkbox",
        ParagraphStyle::CheckboxChecked => "checkbox-checked",
        _ => "plain",
    }
}

/// Escapes the five XML-significant characters.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
