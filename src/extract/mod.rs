//! Page extraction: format detection and dispatch to the archive reader or
//! PDF rasterizer

mod archive;
mod detect;
#[cfg(feature = "pdf")]
mod pdf;
mod request;
mod service;

use std::path::Path;

use log::{debug, info};

pub use archive::extract_archive;
pub use detect::{Format, PDF_CONTENT_TYPE, PDF_SIGNATURE, SourceHint, detect};
#[cfg(feature = "pdf")]
pub use pdf::{JPEG_QUALITY, RENDER_SCALE, extract_pdf, page_file_name};
pub use request::{ExtractionRequest, ExtractionResponse, RequestId};
pub use service::{DEFAULT_WORKERS, ExtractionService};

use crate::comic::Page;
use crate::error::Result;

/// Extract the ordered page sequence of a blob with no metadata attached
pub fn extract_pages(blob: &[u8]) -> Result<Vec<Page>> {
    extract_pages_with_hint(blob, &SourceHint::default())
}

/// Extract the ordered page sequence of a blob.
///
/// Stateless: nothing is cached, and the same input always yields the same
/// pages. Errors fail the whole call; partial page lists are never returned.
pub fn extract_pages_with_hint(blob: &[u8], hint: &SourceHint) -> Result<Vec<Page>> {
    let format = detect(blob, hint);
    debug!(
        "Extracting {} bytes as {format:?} (name: {:?})",
        blob.len(),
        hint.file_name
    );

    let pages = match format {
        Format::Pdf => extract_pdf_pages(blob)?,
        Format::Archive => extract_archive(blob)?,
    };

    info!("Extracted {} pages", pages.len());
    Ok(pages)
}

/// Read a file and extract its pages, using the file name as a hint
pub fn extract_file(path: &Path) -> Result<Vec<Page>> {
    let blob = std::fs::read(path)?;
    extract_pages_with_hint(&blob, &SourceHint::for_path(path))
}

#[cfg(feature = "pdf")]
fn extract_pdf_pages(blob: &[u8]) -> Result<Vec<Page>> {
    extract_pdf(blob)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf_pages(_blob: &[u8]) -> Result<Vec<Page>> {
    Err(crate::error::Error::unsupported(
        "PDF support is disabled (build with the `pdf` feature)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::build_zip;

    #[test]
    fn archive_blobs_go_to_the_archive_reader() {
        let blob = build_zip(&[("page10.jpg", b"10".as_slice()), ("page2.jpg", b"2")]);
        let pages = extract_pages(&blob).unwrap();
        assert_eq!(pages[0].file_name, "page2.jpg");
        assert_eq!(pages[1].file_name, "page10.jpg");
    }

    #[test]
    fn extraction_is_repeatable() {
        let blob = build_zip(&[("b.png", b"bb".as_slice()), ("a.png", b"aa")]);
        assert_eq!(extract_pages(&blob).unwrap(), extract_pages(&blob).unwrap());
    }

    #[test]
    fn pdf_name_routes_to_rasterizer_even_for_zip_bytes() {
        let blob = build_zip(&[("a.png", b"aa".as_slice())]);
        let hint = SourceHint::new().with_file_name("mislabeled.pdf");
        let err = extract_pages_with_hint(&blob, &hint).unwrap_err();
        assert!(!matches!(err, Error::EmptyArchive));
        assert!(err.is_extraction_failure());
    }

    #[test]
    fn extract_file_uses_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issue.cbz");
        std::fs::write(&path, build_zip(&[("01.jpg", b"x".as_slice())])).unwrap();

        let pages = extract_file(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].file_name, "01.jpg");
    }
}
