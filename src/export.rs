//! Writing extracted pages back out as image files

use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::comic::Page;
use crate::data_uri::{self, DataUri};

const MAX_NAME_LEN: usize = 200;

static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("Failed to compile filename regex")
});

static RESERVED_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])(\..*)?$")
        .expect("Failed to compile reserved name regex")
});

/// Make a file name safe on Windows, macOS and Linux
pub fn sanitize_filename(name: &str) -> String {
    let sanitized = INVALID_CHARS.replace_all(name, "_");
    let sanitized = sanitized.trim_matches(|c| c == ' ' || c == '.');

    if RESERVED_NAMES.is_match(sanitized) {
        return format!("_{sanitized}");
    }

    let mut end = sanitized.len().min(MAX_NAME_LEN);
    while !sanitized.is_char_boundary(end) {
        end -= 1;
    }
    let sanitized = &sanitized[..end];

    if sanitized.is_empty() {
        "untitled".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Output name for a page: its base name, with an extension matching the
/// payload's MIME type
pub fn page_export_name(page: &Page, mime: &str) -> String {
    let base = page
        .file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&page.file_name);
    let mut name = sanitize_filename(base);
    if !data_uri::is_page_image(&name) {
        name = format!("{name}.{}", data_uri::extension_for_mime(mime));
    }
    name
}

/// Decode every page into `dir`, creating it if needed.
///
/// Pages whose base names collide get their 1-based position as a prefix,
/// plus a counter when that name is taken as well.
pub fn export_pages(pages: &[Page], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let uri = DataUri::parse(&page.data)
            .with_context(|| format!("Page {} has no image data", page.index + 1))?;
        let bytes = uri
            .decode()
            .with_context(|| format!("Failed to decode page {}", page.index + 1))?;

        let name = unique_name(&mut used, page_export_name(page, uri.mime), page.index + 1);

        let path = dir.join(&name);
        fs::write(&path, &bytes).with_context(|| format!("Failed to write {path:?}"))?;
        debug!("Wrote {} bytes to {path:?}", bytes.len());
        written.push(path);
    }

    info!("Exported {} pages to {dir:?}", written.len());
    Ok(written)
}

/// Claim `name` in `used`, falling back to prefixed variants until one is free
fn unique_name(used: &mut HashSet<String>, name: String, position: usize) -> String {
    if used.insert(name.to_lowercase()) {
        return name;
    }
    let mut candidate = format!("{position:03}_{name}");
    let mut attempt = 1;
    while !used.insert(candidate.to_lowercase()) {
        attempt += 1;
        candidate = format!("{position:03}-{attempt}_{name}");
    }
    candidate
}
