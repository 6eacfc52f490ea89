//! Format sniffing for imported blobs

use std::path::Path;

/// Signature every PDF file starts with
pub const PDF_SIGNATURE: &[u8; 5] = b"%PDF-";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Container format of a comic blob
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Archive,
}

/// Metadata that travels with a blob: the declared content type and the
/// original file name, when known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceHint {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl SourceHint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Hint carrying the file name component of `path`
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.file_name() {
            Some(name) => Self::new().with_file_name(name.to_string_lossy()),
            None => Self::new(),
        }
    }
}

/// Classify a blob.
///
/// Checked in order: declared content type, `.pdf` file name, `%PDF-`
/// signature. Anything else is treated as an archive; a bad archive surfaces
/// later as an extraction error.
pub fn detect(blob: &[u8], hint: &SourceHint) -> Format {
    if hint.content_type.as_deref() == Some(PDF_CONTENT_TYPE) {
        return Format::Pdf;
    }

    if hint
        .file_name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().ends_with(".pdf"))
    {
        return Format::Pdf;
    }

    if blob.get(..PDF_SIGNATURE.len()) == Some(PDF_SIGNATURE.as_slice()) {
        return Format::Pdf;
    }

    Format::Archive
}
