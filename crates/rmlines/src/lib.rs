//! Convert reMarkable tablet v6 notebook files to SVG or PDF.
//!
//! The heavy lifting lives in [`rmlines_scene`] (parsing) and
//! [`rmlines_export`] (rendering); this crate wires them into one-call
//! conversions and handles the notebook-level concerns: output format
//! inference, multipage assembly and `.content` page ordering.
//!
//! ```no_run
//! # fn main() -> Result<(), rmlines::ConvertError> {
//! let data = std::fs::read("page.rm").unwrap();
//! let svg = rmlines::convert_data(&data, rmlines::Format::Svg)?;
//! std::fs::write("page.svg", svg).unwrap();
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

pub mod content;

pub use rmlines_export::{PdfError, RenderError};
pub use rmlines_scene::ParseError;

/// Output format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Svg,
    Pdf,
}

impl Format {
    /// Infers a format from a file extension; anything unrecognised is PDF.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Format::Svg,
            _ => Format::Pdf,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse .rm file")]
    Parse(#[from] ParseError),
    #[error("failed to render scene")]
    Render(#[from] RenderError),
    #[error("failed to produce PDF")]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no input files provided")]
    NoInputs,
}

/// Converts one `.rm` page from a reader.
pub fn convert_reader<R: Read>(input: R, format: Format) -> Result<Vec<u8>, ConvertError> {
    let tree = rmlines_scene::read_scene_tree(input)?;
    let out = match format {
        Format::Svg => rmlines_export::render_svg(&tree)?.into_bytes(),
        Format::Pdf => rmlines_export::render_pdf(&tree)?,
    };
    Ok(out)
}

/// Converts one `.rm` page held in memory.
pub fn convert_data(data: &[u8], format: Format) -> Result<Vec<u8>, ConvertError> {
    convert_reader(data, format)
}

/// Converts a `.rm` file to an output file, inferring the format from the
/// output path when none is given.
pub fn convert_file(
    input: &Path,
    output: &Path,
    format: Option<Format>,
) -> Result<(), ConvertError> {
    let format = format.unwrap_or_else(|| Format::from_path(output));
    let file = File::open(input)?;
    let out = convert_reader(file, format)?;
    std::fs::write(output, out)?;
    Ok(())
}

/// Converts ordered `.rm` pages into one multipage PDF.
pub fn convert_files_to_pdf(inputs: &[std::path::PathBuf]) -> Result<Vec<u8>, ConvertError> {
    if inputs.is_empty() {
        return Err(ConvertError::NoInputs);
    }
    let mut pages = Vec::with_capacity(inputs.len());
    for path in inputs {
        let file = File::open(path)?;
        let tree = rmlines_scene::read_scene_tree(file)?;
        pages.push(rmlines_export::render_pdf(&tree)?);
    }
    Ok(rmlines_export::concat_pdfs(&pages)?)
}
