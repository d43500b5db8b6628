//! Pen model: how a stroke's tool, colour and per-point samples become
//! per-segment colour, width and opacity.
//!
//! All tool-specific constants and formulas live here; the emitter only
//! asks a [`PenProfile`] for the three segment properties.

use rmlines_scene::{Pen, PenColor, Point, Rgba};

/// An opaque RGB colour in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

/// Palette colour of a pen colour index, when one is defined.
pub fn palette_rgb(color: PenColor) -> Option<Rgb> {
    let (r, g, b) = match color {
        PenColor::Black => (0, 0, 0),
        PenColor::Gray => (144, 144, 144),
        PenColor::White => (255, 255, 255),
        PenColor::Yellow => (251, 247, 25),
        PenColor::Green => (0, 255, 0),
        PenColor::Pink => (255, 192, 203),
        PenColor::Blue => (78, 105, 201),
        PenColor::Red => (179, 62, 57),
        PenColor::GrayOverlap => (125, 125, 125),
        PenColor::Highlight => (255, 237, 117),
        PenColor::Green2 => (161, 216, 125),
        PenColor::Cyan => (139, 208, 229),
        PenColor::Magenta => (183, 130, 205),
        PenColor::Yellow2 => (247, 232, 81),
        _ => return None,
    };
    Some(Rgb { r, g, b })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PenKind {
    Ballpoint,
    Fineliner,
    Marker,
    Pencil,
    MechanicalPencil,
    Brush,
    Highlighter,
    Eraser,
    EraseArea,
    Calligraphy,
    Shader,
    Default,
}

/// Resolved drawing parameters for one stroke.
#[derive(Debug, Clone)]
pub struct PenProfile {
    kind: PenKind,
    pub base_width: f64,
    pub base_color: Rgb,
    /// Points per segment; a segment shares one colour/width/opacity.
    pub segment_length: usize,
    pub base_opacity: f64,
    pub stroke_linecap: &'static str,
    pub stroke_opacity: f64,
}

impl PenProfile {
    /// Builds the profile for a stroke. The override colour, when present,
    /// wins over the palette; a colour without a palette entry renders
    /// black.
    pub fn new(
        tool: Pen,
        color: PenColor,
        color_override: Option<Rgba>,
        thickness_scale: f64,
    ) -> PenProfile {
        let base_color = match color_override {
            Some(rgba) => Rgb {
                r: rgba.r,
                g: rgba.g,
                b: rgba.b,
            },
            None => palette_rgb(color).unwrap_or(Rgb::BLACK),
        };

        let mut p = PenProfile {
            kind: PenKind::Default,
            base_width: thickness_scale,
            base_color,
            segment_length: 1000,
            base_opacity: 1.0,
            stroke_linecap: "round",
            stroke_opacity: 1.0,
        };

        match tool {
            Pen::Ballpoint1 | Pen::Ballpoint2 => {
                p.kind = PenKind::Ballpoint;
                p.segment_length = 5;
            }
            Pen::Fineliner1 | Pen::Fineliner2 => {
                p.kind = PenKind::Fineliner;
                p.base_width = thickness_scale * 1.8;
            }
            Pen::Marker1 | Pen::Marker2 => {
                p.kind = PenKind::Marker;
                p.segment_length = 3;
            }
            Pen::Pencil1 | Pen::Pencil2 => {
                p.kind = PenKind::Pencil;
                p.segment_length = 2;
            }
            Pen::MechanicalPencil1 | Pen::MechanicalPencil2 => {
                p.kind = PenKind::MechanicalPencil;
                p.base_width = thickness_scale * thickness_scale;
                p.base_opacity = 0.7;
            }
            Pen::Paintbrush1 | Pen::Paintbrush2 => {
                p.kind = PenKind::Brush;
                p.segment_length = 2;
            }
            Pen::Highlighter1 | Pen::Highlighter2 => {
                p.kind = PenKind::Highlighter;
                p.base_width = 15.0;
                p.stroke_linecap = "square";
                p.base_opacity = 0.3;
                p.stroke_opacity = 0.2;
            }
            Pen::Eraser => {
                p.kind = PenKind::Eraser;
                p.base_width = thickness_scale * 2.0;
                p.stroke_linecap = "square";
                p.base_color = Rgb::WHITE;
            }
            Pen::EraserArea => {
                p.kind = PenKind::EraseArea;
                p.stroke_linecap = "square";
                p.base_opacity = 0.0;
            }
            Pen::Calligraphy => {
                p.kind = PenKind::Calligraphy;
                p.segment_length = 2;
            }
            Pen::Shader => {
                p.kind = PenKind::Shader;
                p.base_width = 12.0;
                p.base_opacity = 0.1;
            }
            Pen::Unknown(_) => {}
        }

        p
    }

    /// Colour of the segment starting at `point`.
    pub fn segment_color(&self, point: &Point) -> Rgb {
        let speed = point.speed as f64 / 4.0;
        let pressure = point.pressure as f64 / 255.0;
        match self.kind {
            PenKind::Ballpoint => {
                let intensity = clamp01(0.1 * -(speed / 35.0) + 1.2 * pressure + 0.5);
                // Cap the darkening so light touches stay close to the base.
                let factor = (intensity - 1.0).abs().min(0.235);
                scale_color(self.base_color, 1.0 - factor)
            }
            PenKind::Brush => {
                let intensity = clamp01(pressure.powf(1.5) - 0.2 * (speed / 50.0));
                scale_color(self.base_color, intensity)
            }
            _ => self.base_color,
        }
    }

    /// Width of the segment starting at `point`. `last_width` is the width
    /// of the previous segment, which some tools blend with.
    pub fn segment_width(&self, point: &Point, last_width: f64) -> f64 {
        let speed = point.speed as f64 / 4.0;
        let pressure = point.pressure as f64 / 255.0;
        let width = point.width as f64 / 4.0;
        let tilt = direction_to_tilt(point.direction);
        match self.kind {
            PenKind::Ballpoint => (0.5 + pressure) + width - 0.5 * (speed / 50.0),
            PenKind::Marker => 0.9 * (width - 0.4 * tilt) + 0.1 * last_width,
            PenKind::Pencil => {
                let seg = 0.7
                    * ((0.8 * self.base_width + 0.5 * pressure) * width
                        - 0.25 * tilt.powf(1.8)
                        - 0.6 * (speed / 50.0));
                seg.min(self.base_width * 10.0)
            }
            PenKind::Brush => 0.7 * ((1.0 + 1.4 * pressure) * width - 0.5 * tilt - speed / 50.0),
            PenKind::Calligraphy => 0.9 * ((1.0 + pressure) * width - 0.3 * tilt) + 0.1 * last_width,
            _ => self.base_width,
        }
    }

    /// Opacity of the segment starting at `point`.
    pub fn segment_opacity(&self, point: &Point) -> f64 {
        let speed = point.speed as f64 / 4.0;
        let pressure = point.pressure as f64 / 255.0;
        match self.kind {
            PenKind::Pencil => clamp01(0.1 * -(speed / 35.0) + pressure) - 0.1,
            _ => self.base_opacity,
        }
    }
}

fn scale_color(c: Rgb, factor: f64) -> Rgb {
    Rgb {
        r: (c.r as f64 * factor) as u8,
        g: (c.g as f64 * factor) as u8,
        b: (c.b as f64 * factor) as u8,
    }
}

fn direction_to_tilt(direction: u8) -> f64 {
    direction as f64 * (std::f64::consts::PI * 2.0) / 255.0
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
