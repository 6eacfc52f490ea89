//! Background extraction - worker threads fed from a shared request queue

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use super::request::{ExtractionRequest, ExtractionResponse, RequestId};
use super::{SourceHint, extract_pages_with_hint};

/// Number of worker threads used by [`ExtractionService::new`]
pub const DEFAULT_WORKERS: usize = 2;

/// Runs page extraction off the caller's thread.
///
/// Every submission is extracted independently; identical blobs submitted
/// twice are extracted twice. There is no cancellation: callers compare a
/// response's id against [`ExtractionService::latest_request`] and drop stale
/// results.
pub struct ExtractionService {
    request_tx: Sender<ExtractionRequest>,
    response_rx: Receiver<ExtractionResponse>,
    next_request_id: u64,
    latest_request: Option<RequestId>,
    num_workers: usize,
}

impl Default for ExtractionService {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionService {
    #[must_use]
    pub fn new() -> Self {
        Self::with_workers(DEFAULT_WORKERS)
    }

    #[must_use]
    pub fn with_workers(num_workers: usize) -> Self {
        // MPMC: every worker pulls from the same request queue
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let num_workers = num_workers.max(1);
        for _ in 0..num_workers {
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            std::thread::spawn(move || extraction_worker(&rx, &tx));
        }

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            latest_request: None,
            num_workers,
        }
    }

    /// Queue a blob for extraction and return the id its response will carry
    pub fn submit(&mut self, blob: impl Into<Arc<[u8]>>, hint: SourceHint) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        self.latest_request = Some(id);

        let request = ExtractionRequest::Extract {
            id,
            blob: blob.into(),
            hint,
        };
        if self.request_tx.send(request).is_err() {
            warn!("Extraction workers are gone, request {id:?} dropped");
        }
        id
    }

    /// Id of the most recent submission
    #[must_use]
    pub fn latest_request(&self) -> Option<RequestId> {
        self.latest_request
    }

    /// Whether a response belongs to the most recent submission
    #[must_use]
    pub fn is_current(&self, response: &ExtractionResponse) -> bool {
        self.latest_request == Some(response.id())
    }

    /// Non-blocking poll for a finished extraction
    pub fn try_recv(&self) -> Option<ExtractionResponse> {
        self.response_rx.try_recv().ok()
    }

    /// Wait for the next finished extraction
    pub fn recv(&self) -> Option<ExtractionResponse> {
        self.response_rx.recv().ok()
    }

    /// Wait up to `timeout` for the next finished extraction
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ExtractionResponse> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the response for `id` arrives, discarding any other
    pub fn wait_for(&self, id: RequestId) -> Option<ExtractionResponse> {
        loop {
            let response = self.recv()?;
            if response.id() == id {
                return Some(response);
            }
            debug!("Discarding stale extraction response {:?}", response.id());
        }
    }
}

impl Drop for ExtractionService {
    fn drop(&mut self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(ExtractionRequest::Shutdown);
        }
    }
}

fn extraction_worker(requests: &Receiver<ExtractionRequest>, responses: &Sender<ExtractionResponse>) {
    for request in requests {
        match request {
            ExtractionRequest::Extract { id, blob, hint } => {
                let response = match extract_pages_with_hint(&blob, &hint) {
                    Ok(pages) => ExtractionResponse::Pages { id, pages },
                    Err(error) => ExtractionResponse::Failed { id, error },
                };
                let _ = responses.send(response);
            }

            ExtractionRequest::Shutdown => break,
        }
    }
}
