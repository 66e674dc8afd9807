//! In-memory ingestion backend for tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use docupload_protocol::{
    ChunkUploadResponse, FileId, FinalizeUploadRequest, InitiateUploadRequest,
    InitiateUploadResponse, ProcessedDocument, ProcessingDetails, UploadChunkRequest,
};

use crate::backend::{BackendFuture, IngestionBackend};
use crate::error::BackendError;
use crate::types::UploadSpec;

/// Backend operation as recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Direct { size: u64 },
    Initiate { total_chunks: u32, total_size: u64 },
    Chunk { index: u32 },
    Finalize { upload_id: String },
}

pub(crate) const UPLOAD_ID: &str = "mock-upload";

pub(crate) fn processed(file_id: i64) -> ProcessedDocument {
    ProcessedDocument {
        message: "Document uploaded and processed successfully".into(),
        details: ProcessingDetails {
            file_id: FileId::Number(file_id),
            file_url: "/uploads/doc.pdf".into(),
            total_chunks: 8,
            processing_time_seconds: 0.5,
        },
    }
}

pub(crate) fn transient() -> BackendError {
    BackendError::Status {
        status: 503,
        detail: "unavailable".into(),
    }
}

pub(crate) fn too_large() -> BackendError {
    BackendError::TooLarge {
        detail: "File too large for direct upload.".into(),
        suggestion: Some("Use chunked upload API for files larger than 10MB.".into()),
    }
}

/// Scripted backend that records every call.
#[derive(Default)]
pub(crate) struct MockBackend {
    calls: Mutex<Vec<Call>>,
    direct_errors: Mutex<VecDeque<BackendError>>,
    initiate_error: Mutex<Option<BackendError>>,
    chunk_errors: Mutex<HashMap<u32, VecDeque<BackendError>>>,
    finalize_error: Mutex<Option<BackendError>>,
    finalize_hangs: AtomicBool,
    received: Mutex<BTreeMap<u32, Vec<u8>>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_direct(self, err: BackendError) -> Self {
        self.direct_errors.lock().unwrap().push_back(err);
        self
    }

    pub(crate) fn fail_initiate(self, err: BackendError) -> Self {
        *self.initiate_error.lock().unwrap() = Some(err);
        self
    }

    /// Fails the next attempts at chunk `index` with `errors`, in order.
    pub(crate) fn fail_chunk(self, index: u32, errors: Vec<BackendError>) -> Self {
        self.chunk_errors
            .lock()
            .unwrap()
            .entry(index)
            .or_default()
            .extend(errors);
        self
    }

    pub(crate) fn fail_finalize(self, err: BackendError) -> Self {
        *self.finalize_error.lock().unwrap() = Some(err);
        self
    }

    /// Finalize never answers.
    pub(crate) fn hang_finalize(self) -> Self {
        self.finalize_hangs.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Chunk indices in the order they were attempted.
    pub(crate) fn chunk_attempts(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Chunk { index } => Some(index),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(*c)).count()
    }

    /// Document as reassembled from the accepted chunks.
    pub(crate) fn received_bytes(&self) -> Vec<u8> {
        self.received
            .lock()
            .unwrap()
            .values()
            .flat_map(|c| c.iter().copied())
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl IngestionBackend for MockBackend {
    fn direct_upload<'a>(
        &'a self,
        spec: &'a UploadSpec,
        _timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument> {
        self.record(Call::Direct {
            size: spec.total_size(),
        });
        let result = match self.direct_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(processed(1)),
        };
        Box::pin(async move { result })
    }

    fn initiate<'a>(
        &'a self,
        req: &'a InitiateUploadRequest,
        _timeout: Duration,
    ) -> BackendFuture<'a, InitiateUploadResponse> {
        self.record(Call::Initiate {
            total_chunks: req.total_chunks,
            total_size: req.total_size,
        });
        self.received.lock().unwrap().clear();
        let result = match self.initiate_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(InitiateUploadResponse {
                upload_id: UPLOAD_ID.into(),
                expires_at: String::new(),
            }),
        };
        Box::pin(async move { result })
    }

    fn upload_chunk<'a>(
        &'a self,
        req: &'a UploadChunkRequest,
        _timeout: Duration,
    ) -> BackendFuture<'a, ChunkUploadResponse> {
        self.record(Call::Chunk {
            index: req.chunk_index,
        });
        let scripted = self
            .chunk_errors
            .lock()
            .unwrap()
            .get_mut(&req.chunk_index)
            .and_then(VecDeque::pop_front);
        let result = match scripted {
            Some(err) => Err(err),
            None => match docupload_transfer::decode(&req.chunk_data) {
                Ok(raw) => {
                    let mut received = self.received.lock().unwrap();
                    received.insert(req.chunk_index, raw);
                    let chunks_received = received.len() as u32;
                    Ok(ChunkUploadResponse {
                        upload_id: req.upload_id.clone(),
                        chunks_received,
                        total_chunks: req.total_chunks,
                        is_complete: chunks_received == req.total_chunks,
                    })
                }
                Err(e) => Err(BackendError::Status {
                    status: 400,
                    detail: e.to_string(),
                }),
            },
        };
        Box::pin(async move { result })
    }

    fn finalize<'a>(
        &'a self,
        req: &'a FinalizeUploadRequest,
        _timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument> {
        self.record(Call::Finalize {
            upload_id: req.upload_id.clone(),
        });
        if self.finalize_hangs.load(Ordering::SeqCst) {
            return Box::pin(std::future::pending());
        }
        let result = match self.finalize_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(processed(2)),
        };
        Box::pin(async move { result })
    }
}
