//! Error types for page extraction and panel geometry

/// Errors surfaced by the extraction pipeline and panel box validation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Blob is neither a readable archive nor a readable PDF
    #[error("unsupported format: {detail}")]
    UnsupportedFormat { detail: String },

    /// Archive opened fine but holds no page images
    #[error("archive contains no page images")]
    EmptyArchive,

    /// Document or one of its pages failed to parse or render
    #[error("corrupt PDF: {detail}")]
    CorruptPdf { detail: String },

    /// Panel coordinates violate `min <= max` or leave the 0..=100 range
    #[error("malformed panel box: x {xmin}..{xmax}, y {ymin}..{ymax}")]
    MalformedPanelBox {
        xmin: f32,
        ymin: f32,
        xmax: f32,
        ymax: f32,
    },

    /// String is not a base64 data URI
    #[error("invalid data URI: {detail}")]
    InvalidDataUri { detail: String },

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat { detail: msg.into() }
    }

    pub fn corrupt_pdf(msg: impl Into<String>) -> Self {
        Self::CorruptPdf { detail: msg.into() }
    }

    pub fn invalid_data_uri(msg: impl Into<String>) -> Self {
        Self::InvalidDataUri { detail: msg.into() }
    }

    /// True for the kinds that mean "this file cannot be read as a comic"
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::EmptyArchive | Self::CorruptPdf { .. }
        )
    }
}

#[cfg(feature = "pdf")]
impl From<mupdf::error::Error> for Error {
    fn from(err: mupdf::error::Error) -> Self {
        Self::corrupt_pdf(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failures_are_classified() {
        assert!(Error::unsupported("nope").is_extraction_failure());
        assert!(Error::EmptyArchive.is_extraction_failure());
        assert!(Error::corrupt_pdf("bad xref").is_extraction_failure());
        assert!(!Error::invalid_data_uri("x").is_extraction_failure());
    }

    #[test]
    fn messages_carry_detail() {
        let err = Error::corrupt_pdf("page 3 failed to render");
        assert_eq!(err.to_string(), "corrupt PDF: page 3 failed to render");
    }
}
