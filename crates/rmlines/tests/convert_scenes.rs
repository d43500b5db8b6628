//! End-to-end conversions over synthesised notebook pages.

mod common;

use common::*;
use rmlines::{convert_data, Format};
use rmlines_scene::CrdtId;

const SCALE: f64 = 72.0 / 226.0;

fn scale(v: f64) -> f64 {
    v * SCALE
}

fn svg_of(blocks: &[Vec<u8>]) -> String {
    let data = file(blocks);
    String::from_utf8(convert_data(&data, Format::Svg).unwrap()).unwrap()
}

#[test]
fn empty_scene() {
    let svg = svg_of(&[]);
    let width = scale(1404.0 + 1.0);
    let height = scale(1872.0 + 1.0);
    assert!(svg.contains(&format!("width=\"{width:.1}\"")));
    assert!(svg.contains(&format!("height=\"{height:.1}\"")));
    assert_eq!(svg.matches("<g id=\"p1\"").count(), 1);
    assert!(!svg.contains("<polyline"));
    assert!(!svg.contains("<text"));
}

#[test]
fn single_fineliner_line() {
    let layer = CrdtId::new(0, 11);
    let points = [
        (0.0, 0.0, 0, 40, 0, 255),
        (100.0, 0.0, 0, 40, 0, 255),
        (100.0, 100.0, 0, 40, 0, 255),
    ];
    let svg = svg_of(&[
        scene_tree_block(layer, CrdtId::new(0, 1)),
        tree_node_block(layer, "Layer 1"),
        line_item_block(layer, CrdtId::new(1, 20), 17, 0, 1.0, &points),
    ]);

    assert_eq!(svg.matches("<polyline").count(), 1);
    assert!(svg.contains("stroke:rgb(0,0,0)"));
    assert!(svg.contains("stroke-linecap=\"round\""));
    assert!(svg.contains("opacity:1.000"));
    assert!(svg.contains(&format!("stroke-width:{:.3}", scale(1.8))));
    assert!(svg.contains("points=\"0.000,0.000 31.858,0.000 31.858,31.858 \""));
}

#[test]
fn two_paragraph_text() {
    let items = vec![
        text_item(CrdtId::new(1, 10), 0, "Hello\n"),
        text_item(CrdtId::new(1, 16), 0, "World"),
    ];
    let formats = vec![text_format(CrdtId::new(1, 10), CrdtId::new(0, 70), 2)];
    let svg = svg_of(&[root_text_block(&items, &formats, (0.0, 0.0), 600.0)]);

    let y_heading = scale(-88.0 + 150.0);
    let y_plain = scale(-88.0 + 150.0 + 70.0);
    assert!(svg.contains(&format!("y=\"{y_heading:.3}\" class=\"heading\">Hello</text>")));
    assert!(svg.contains(&format!("y=\"{y_plain:.3}\" class=\"plain\">World</text>")));
}

#[test]
fn group_anchored_to_second_paragraph() {
    let layer = CrdtId::new(0, 11);
    let items = vec![
        text_item(CrdtId::new(1, 10), 0, "Hello\n"),
        text_item(CrdtId::new(1, 16), 0, "World"),
    ];
    let formats = vec![text_format(CrdtId::new(1, 10), CrdtId::new(0, 70), 2)];
    // The newline terminating "Hello" is character 5 of the first item.
    let newline_id = CrdtId::new(1, 15);
    let svg = svg_of(&[
        root_text_block(&items, &formats, (0.0, 0.0), 600.0),
        scene_tree_block(layer, CrdtId::new(0, 1)),
        anchored_tree_node_block(layer, newline_id, 40.0),
    ]);

    let x = scale(40.0);
    let y = scale(-88.0 + 150.0);
    assert!(svg.contains(&format!("transform=\"translate({x:.3}, {y:.3})\"")));
}

#[test]
fn pencil_pressure_segment() {
    let layer = CrdtId::new(0, 11);
    let points = [(0.0, 0.0, 0, 40, 0, 255), (10.0, 0.0, 0, 40, 0, 255)];
    let svg = svg_of(&[
        scene_tree_block(layer, CrdtId::new(0, 1)),
        line_item_block(layer, CrdtId::new(1, 20), 14, 0, 1.0, &points),
    ]);

    // width/4 = 10, full pressure, no speed or tilt.
    let expected_width = scale(0.7 * (0.8 + 0.5) * 10.0);
    assert!(svg.contains(&format!("stroke-width:{expected_width:.3}")));
    assert!(svg.contains("opacity:0.900"));
}

#[test]
fn unknown_block_is_invisible_in_output() {
    let layer = CrdtId::new(0, 11);
    let points = [(5.0, 5.0, 0, 40, 0, 255)];
    let with_unknown = svg_of(&[
        block(0xFF, 1, &[0x5A; 37]),
        scene_tree_block(layer, CrdtId::new(0, 1)),
        line_item_block(layer, CrdtId::new(1, 20), 4, 0, 1.0, &points),
    ]);
    let without = svg_of(&[
        scene_tree_block(layer, CrdtId::new(0, 1)),
        line_item_block(layer, CrdtId::new(1, 20), 4, 0, 1.0, &points),
    ]);
    assert_eq!(with_unknown, without);
}

#[test]
fn conversion_is_deterministic() {
    let layer = CrdtId::new(0, 11);
    let blocks = vec![
        scene_tree_block(layer, CrdtId::new(0, 1)),
        line_item_block(
            layer,
            CrdtId::new(1, 20),
            2,
            1,
            1.0,
            &[(0.0, 0.0, 8, 40, 3, 120), (4.0, 9.0, 8, 40, 3, 130)],
        ),
        root_text_block(
            &[text_item(CrdtId::new(1, 10), 0, "Same\nevery\ntime")],
            &[],
            (-20.0, 30.0),
            500.0,
        ),
    ];
    assert_eq!(svg_of(&blocks), svg_of(&blocks));
}

#[test]
fn ballpoint_emits_one_polyline_per_five_points() {
    let layer = CrdtId::new(0, 11);
    let points: Vec<_> = (0..11)
        .map(|i| (i as f32, 0.0, 0, 40, 0, 200))
        .collect();
    let svg = svg_of(&[
        scene_tree_block(layer, CrdtId::new(0, 1)),
        line_item_block(layer, CrdtId::new(1, 20), 15, 0, 1.0, &points),
    ]);
    assert_eq!(svg.matches("<polyline").count(), 3); // ceil(11 / 5)
}

#[test]
fn text_is_xml_escaped() {
    let items = vec![text_item(CrdtId::new(1, 10), 0, "a < b & c")];
    let svg = svg_of(&[root_text_block(&items, &[], (0.0, 0.0), 600.0)]);
    assert!(svg.contains(">a &lt; b &amp; c</text>"));
}

#[test]
fn not_a_v6_file_fails() {
    let data = b"definitely not a lines file".to_vec();
    assert!(convert_data(&data, Format::Svg).is_err());
}
