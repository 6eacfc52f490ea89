//! PDF rasterization into JPEG pages

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use crate::comic::Page;
use crate::data_uri;
use crate::error::{Error, Result};

/// Magnification applied to the document's intrinsic page units
pub const RENDER_SCALE: f32 = 2.0;

/// JPEG quality (0.8 on a 0..1 scale)
pub const JPEG_QUALITY: u8 = 80;

const PAGE_MIME: &str = "image/jpeg";

/// Synthetic file name for a 1-based page number: `page-001.jpg`
pub fn page_file_name(number: usize) -> String {
    format!("page-{number:03}.jpg")
}

/// Render every page of a PDF, in document order.
///
/// Pages are rendered one at a time on a single pixmap. A document without
/// pages, or any page that fails to render, aborts the whole extraction with
/// [`Error::CorruptPdf`].
pub fn extract_pdf(blob: &[u8]) -> Result<Vec<Page>> {
    let doc = Document::from_bytes(blob, "application/pdf")
        .map_err(|e| Error::corrupt_pdf(format!("cannot open document: {e}")))?;
    let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
    if page_count == 0 {
        return Err(Error::corrupt_pdf("document has no pages"));
    }
    debug!("Rasterizing {page_count} PDF pages at {RENDER_SCALE}x");

    let transform = Matrix::new_scale(RENDER_SCALE, RENDER_SCALE);
    let rgb = Colorspace::device_rgb();

    collect_pages(page_count, |index| render_page(&doc, index, &transform, &rgb))
}

/// Render pages in order; the first failure discards everything rendered so far
fn collect_pages<F>(page_count: usize, mut render: F) -> Result<Vec<Page>>
where
    F: FnMut(usize) -> Result<Vec<u8>>,
{
    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let jpeg =
            render(index).map_err(|e| Error::corrupt_pdf(format!("page {}: {e}", index + 1)))?;
        pages.push(Page {
            index,
            file_name: page_file_name(index + 1),
            data: data_uri::encode(PAGE_MIME, &jpeg),
        });
    }

    Ok(pages)
}

fn render_page(
    doc: &Document,
    index: usize,
    transform: &Matrix,
    colorspace: &Colorspace,
) -> Result<Vec<u8>> {
    let page_num = i32::try_from(index).map_err(|_| Error::corrupt_pdf("page index overflow"))?;
    let page = doc.load_page(page_num)?;
    let pixmap = page.to_pixmap(transform, colorspace, false, false)?;
    let pixels = pixmap_to_rgb(&pixmap)?;
    encode_jpeg(&pixels, pixmap.width(), pixmap.height())
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(Error::corrupt_pdf(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(Error::corrupt_pdf("pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}

fn encode_jpeg(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| Error::corrupt_pdf(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::minimal_pdf;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(page_file_name(1), "page-001.jpg");
        assert_eq!(page_file_name(42), "page-042.jpg");
        assert_eq!(page_file_name(999), "page-999.jpg");
        assert_eq!(page_file_name(1000), "page-1000.jpg");
    }

    #[test]
    fn encode_jpeg_produces_jfif() {
        let rgb = vec![200u8; 4 * 4 * 3];
        let jpeg = encode_jpeg(&rgb, 4, 4).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn every_page_is_rendered() {
        let pages = extract_pdf(&minimal_pdf(3)).unwrap();
        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert_eq!(page.file_name, page_file_name(i + 1));
            assert!(page.data.starts_with("data:image/jpeg;base64,"));
        }
    }

    #[test]
    fn pages_render_at_twice_intrinsic_size() {
        let pages = extract_pdf(&minimal_pdf(1)).unwrap();
        let bytes = data_uri::DataUri::parse(&pages[0].data)
            .unwrap()
            .decode()
            .unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (200, 300));
    }

    #[test]
    fn one_failing_page_aborts_the_document() {
        let mut attempted = Vec::new();
        let result = collect_pages(4, |index| {
            attempted.push(index);
            if index == 2 {
                Err(Error::corrupt_pdf("cannot render"))
            } else {
                encode_jpeg(&[0u8; 3], 1, 1)
            }
        });

        match result {
            Err(Error::CorruptPdf { detail }) => assert!(detail.starts_with("page 3:")),
            other => panic!("expected CorruptPdf, got {other:?}"),
        }
        // rendering stops at the failing page
        assert_eq!(attempted, vec![0, 1, 2]);
    }

    #[test]
    fn document_without_pages_is_corrupt() {
        let result = extract_pdf(&minimal_pdf(0));
        assert!(matches!(result, Err(Error::CorruptPdf { .. })));
    }

    #[test]
    fn rendering_is_repeatable() {
        let pdf = minimal_pdf(2);
        assert_eq!(extract_pdf(&pdf).unwrap(), extract_pdf(&pdf).unwrap());
    }

    #[test]
    fn unparsable_document_is_corrupt() {
        let result = extract_pdf(b"%PDF-1.4\nthis is not really a pdf");
        assert!(matches!(result, Err(Error::CorruptPdf { .. })));
    }
}
