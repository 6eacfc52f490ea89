//! Extraction request and response types

use std::sync::Arc;

use super::SourceHint;
use crate::comic::Page;
use crate::error::Error;

/// Unique identifier for extraction requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to extraction workers
#[derive(Debug)]
pub enum ExtractionRequest {
    /// Extract all pages of a blob
    Extract {
        id: RequestId,
        blob: Arc<[u8]>,
        hint: SourceHint,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from extraction workers
#[derive(Debug)]
pub enum ExtractionResponse {
    /// Every page of the blob, in order
    Pages { id: RequestId, pages: Vec<Page> },

    /// Extraction failed as a whole; no pages are delivered
    Failed { id: RequestId, error: Error },
}

impl ExtractionResponse {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Pages { id, .. } | Self::Failed { id, .. } => *id,
        }
    }

    /// Convert into the same result a direct `extract_pages` call returns
    pub fn into_result(self) -> crate::Result<Vec<Page>> {
        match self {
            Self::Pages { pages, .. } => Ok(pages),
            Self::Failed { error, .. } => Err(error),
        }
    }
}
