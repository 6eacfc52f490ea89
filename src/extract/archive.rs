//! Page extraction from ZIP-based comic archives (.cbz, .cdz, .zip)

use std::io::{Cursor, Read};

use log::debug;
use zip::ZipArchive;

use crate::comic::Page;
use crate::data_uri;
use crate::error::{Error, Result};
use crate::natural_sort::natural_cmp;

/// Page candidate found while scanning the archive directory
#[derive(Debug)]
struct ImageEntry {
    /// Position in the archive's central directory
    archive_index: usize,
    name: String,
}

/// Extract every image entry of an archive as a page, in natural name order.
///
/// Directories and non-image entries are skipped. Fails with
/// [`Error::UnsupportedFormat`] when the blob is not a readable archive and
/// [`Error::EmptyArchive`] when no entry qualifies as a page.
pub fn extract_archive(blob: &[u8]) -> Result<Vec<Page>> {
    let mut archive = ZipArchive::new(Cursor::new(blob))
        .map_err(|e| Error::unsupported(format!("not a readable archive: {e}")))?;

    let mut entries = scan_image_entries(&mut archive)?;
    if entries.is_empty() {
        return Err(Error::EmptyArchive);
    }
    entries.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    debug!(
        "Archive holds {} entries, {} page images",
        archive.len(),
        entries.len()
    );

    let mut pages = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let bytes = read_entry(&mut archive, &entry)?;
        let mime = data_uri::mime_for_name(&entry.name);
        pages.push(Page {
            index,
            data: data_uri::encode(mime, &bytes),
            file_name: entry.name,
        });
    }

    Ok(pages)
}

fn scan_image_entries(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<Vec<ImageEntry>> {
    let mut entries = Vec::new();
    for archive_index in 0..archive.len() {
        let file = archive
            .by_index(archive_index)
            .map_err(|e| Error::unsupported(format!("unreadable entry #{archive_index}: {e}")))?;

        if file.is_dir() || !data_uri::is_page_image(file.name()) {
            continue;
        }

        entries.push(ImageEntry {
            archive_index,
            name: file.name().to_string(),
        });
    }
    Ok(entries)
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, entry: &ImageEntry) -> Result<Vec<u8>> {
    let mut file = archive
        .by_index(entry.archive_index)
        .map_err(|e| Error::unsupported(format!("unreadable entry {}: {e}", entry.name)))?;

    // the declared size comes from the archive header and is not trusted
    let declared = file.size();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| Error::unsupported(format!("failed to inflate {}: {e}", entry.name)))?;
    if bytes.len() as u64 != declared {
        return Err(Error::unsupported(format!(
            "{} declares {declared} bytes but holds {}",
            entry.name,
            bytes.len()
        )));
    }
    Ok(bytes)
}
