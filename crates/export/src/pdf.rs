//! PDF output via an external vector converter.
//!
//! SVG is the native output; PDF is produced by handing the SVG to
//! Inkscape and, for multipage documents, merging per-page PDFs with
//! `pdfunite` (Ghostscript as fallback). Everything goes through temporary
//! files that are removed when the conversion ends, on success or failure.

use std::fs;
use std::process::Command;

use rmlines_scene::SceneTree;
use thiserror::Error;

use crate::svg::render_svg;
use crate::RenderError;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(
        "inkscape conversion failed: {0}; ensure 'inkscape' is installed and on PATH \
         (https://inkscape.org/release/) or use SVG output"
    )]
    ConverterFailed(String),
    #[error("pdf merging failed: install 'pdfunite' (poppler-utils) or ghostscript")]
    MergeFailed,
    #[error("no pages to merge")]
    NoPages,
}

/// Renders a scene tree to a single-page PDF.
pub fn render_pdf(tree: &SceneTree) -> Result<Vec<u8>, PdfError> {
    let svg = render_svg(tree)?;
    svg_to_pdf(svg.as_bytes())
}

/// Converts an SVG document to PDF by invoking Inkscape.
pub fn svg_to_pdf(svg: &[u8]) -> Result<Vec<u8>, PdfError> {
    let dir = tempfile::tempdir()?;
    let svg_path = dir.path().join("page.svg");
    let pdf_path = dir.path().join("page.pdf");
    fs::write(&svg_path, svg)?;

    let output = Command::new("inkscape")
        .arg(&svg_path)
        .arg("--export-filename")
        .arg(&pdf_path)
        .output()
        .map_err(|e| PdfError::ConverterFailed(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(PdfError::ConverterFailed(stderr));
    }

    Ok(fs::read(&pdf_path)?)
}

/// Concatenates single-page PDFs into one document, in the given order.
pub fn concat_pdfs(pages: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    if pages.is_empty() {
        return Err(PdfError::NoPages);
    }
    if pages.len() == 1 {
        return Ok(pages[0].clone());
    }

    let dir = tempfile::tempdir()?;
    let mut page_paths = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        let path = dir.path().join(format!("page_{i:03}.pdf"));
        fs::write(&path, page)?;
        page_paths.push(path);
    }
    let out_path = dir.path().join("merged.pdf");

    let united = Command::new("pdfunite")
        .args(&page_paths)
        .arg(&out_path)
        .output();
    let merged = match united {
        Ok(output) if output.status.success() => true,
        _ => {
            let gs = Command::new("gs")
                .args(["-dBATCH", "-dNOPAUSE", "-q", "-sDEVICE=pdfwrite"])
                .arg(format!("-sOutputFile={}", out_path.display()))
                .args(&page_paths)
                .output();
            matches!(gs, Ok(output) if output.status.success())
        }
    };
    if !merged {
        return Err(PdfError::MergeFailed);
    }

    Ok(fs::read(&out_path)?)
}
