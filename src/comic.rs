//! Comic and page records

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// File extensions accepted at import time
pub const IMPORT_EXTENSIONS: [&str; 4] = ["cdz", "cbz", "zip", "pdf"];

static IMPORT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(cdz|cbz|zip|pdf)$").expect("Failed to compile import suffix regex")
});

/// One rasterized leaf of a comic, in reading order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based position in the page sequence
    pub index: usize,
    /// Archive entry name, or `page-NNN.jpg` for PDF pages
    pub file_name: String,
    /// Image payload as a `data:<mime>;base64,...` URI
    pub data: String,
}

/// An imported comic.
///
/// The source blob is kept out of serialized records; the library stores it
/// next to its index and fills it in on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comic {
    pub id: String,
    pub name: String,
    /// Original file name the comic was imported from
    #[serde(default)]
    pub source_name: String,
    #[serde(skip)]
    pub blob: Vec<u8>,
    /// Data URI of page 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Comic {
    /// Create a comic record for a freshly imported file
    pub fn new(source_name: &str, blob: Vec<u8>, cover: Option<String>) -> Self {
        let timestamp = Utc::now();
        Self {
            id: comic_id(&blob, &timestamp),
            name: display_name(source_name),
            source_name: source_name.to_string(),
            blob,
            cover,
            timestamp,
        }
    }

    pub fn has_blob(&self) -> bool {
        !self.blob.is_empty()
    }
}

/// Display name for an imported file: the file name with a recognized comic
/// extension removed.
pub fn display_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    IMPORT_SUFFIX_RE.replace(base, "").into_owned()
}

/// Whether a path has one of the [`IMPORT_EXTENSIONS`]
pub fn is_importable(file_name: &str) -> bool {
    IMPORT_SUFFIX_RE.is_match(file_name)
}

/// Opaque id derived from content and import time
fn comic_id(blob: &[u8], timestamp: &DateTime<Utc>) -> String {
    let mut context = md5::Context::new();
    context.consume(blob);
    context.consume(timestamp.to_rfc3339().as_bytes());
    let digest = context.compute();
    format!("{digest:x}")[..16].to_string()
}
