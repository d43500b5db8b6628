//! Vector output for decoded scenes: SVG directly, PDF through an external
//! converter.

use thiserror::Error;

pub mod pdf;
pub mod pen;
pub mod svg;

pub use pdf::{concat_pdfs, render_pdf, svg_to_pdf, PdfError};
pub use pen::{palette_rgb, PenProfile, Rgb};
pub use svg::render_svg;

/// Errors raised while emitting a vector document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scene tree has no root group")]
    MissingRoot,
}
