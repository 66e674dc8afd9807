//! Seam between the upload logic and the ingestion backend.
//!
//! `HttpBackend` is the production implementation; tests drive the upload
//! flow through an in-memory backend instead.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use docupload_protocol::{
    ChunkUploadResponse, FinalizeUploadRequest, InitiateUploadRequest, InitiateUploadResponse,
    ProcessedDocument, UploadChunkRequest,
};

use crate::error::BackendError;
use crate::types::UploadSpec;

/// Boxed future returned by [`IngestionBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// The four operations of the ingestion backend's upload API.
///
/// Each call carries its own timeout; an expired timeout is reported as
/// [`BackendError::Timeout`].
pub trait IngestionBackend: Send + Sync {
    /// Uploads the whole document in one request.
    fn direct_upload<'a>(
        &'a self,
        spec: &'a UploadSpec,
        timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument>;

    /// Opens a chunked upload session.
    fn initiate<'a>(
        &'a self,
        req: &'a InitiateUploadRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, InitiateUploadResponse>;

    /// Sends one chunk.
    fn upload_chunk<'a>(
        &'a self,
        req: &'a UploadChunkRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, ChunkUploadResponse>;

    /// Assembles the session and runs ingestion.
    fn finalize<'a>(
        &'a self,
        req: &'a FinalizeUploadRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument>;
}

/// Bounds `fut` by `timeout`, reporting expiry as [`BackendError::Timeout`].
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    fut: BackendFuture<'_, T>,
) -> Result<T, BackendError> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| BackendError::Timeout)?
}
