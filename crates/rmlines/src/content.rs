//! The notebook `.content` sidecar: JSON that records page order.
//!
//! A notebook directory holds one `.rm` file per page plus a `.content`
//! file whose `cPages.pages` array lists page ids in document order. The
//! `.rm` files are named by page id, so matching stems against the array
//! recovers the intended order.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageIdx {
    pub timestamp: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentPage {
    pub id: String,
    pub idx: PageIdx,
    /// The device writes this key misspelled.
    #[serde(rename = "modifed")]
    pub modified: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentPages {
    pub pages: Vec<ContentPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentFile {
    #[serde(rename = "cPages")]
    pub c_pages: ContentPages,
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    #[serde(rename = "fileType")]
    pub file_type: String,
}

impl ContentFile {
    pub fn from_json(data: &str) -> Result<ContentFile, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Page ids in document order.
    pub fn page_ids(&self) -> impl Iterator<Item = &str> {
        self.c_pages.pages.iter().map(|p| p.id.as_str())
    }
}

/// Orders `.rm` paths by the sidecar's page list, matching file stems
/// against page ids. Unmatched files are appended, sorted by modification
/// time. Returns `None` when not a single file matches.
pub fn order_files(files: &[PathBuf], content: &ContentFile) -> Option<Vec<PathBuf>> {
    let stem_of = |path: &Path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    };

    let mut ordered = Vec::new();
    for id in content.page_ids() {
        if let Some(file) = files.iter().find(|f| stem_of(f).as_deref() == Some(id)) {
            ordered.push(file.clone());
        }
    }
    if ordered.is_empty() {
        return None;
    }

    if ordered.len() < files.len() {
        let mut leftovers: Vec<PathBuf> = files
            .iter()
            .filter(|f| !ordered.contains(f))
            .cloned()
            .collect();
        sort_by_mtime(&mut leftovers);
        ordered.extend(leftovers);
    }
    Some(ordered)
}

/// Applies a sidecar file to a set of `.rm` paths. The boolean reports
/// whether the sidecar was actually used; on any failure the input order
/// is returned unchanged.
pub fn order_files_with_sidecar(files: &[PathBuf], content_path: &Path) -> (Vec<PathBuf>, bool) {
    let content = match std::fs::read_to_string(content_path)
        .map_err(|e| e.to_string())
        .and_then(|data| ContentFile::from_json(&data).map_err(|e| e.to_string()))
    {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %content_path.display(), error = %err, "could not read content file");
            return (files.to_vec(), false);
        }
    };
    match order_files(files, &content) {
        Some(ordered) => (ordered, true),
        None => (files.to_vec(), false),
    }
}

/// Sorts paths by file modification time, oldest first. Paths whose
/// metadata cannot be read keep their relative order at the front.
pub fn sort_by_mtime(files: &mut [PathBuf]) {
    files.sort_by_key(|path| {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });
}
