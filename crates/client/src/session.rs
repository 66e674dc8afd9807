//! Chunked upload: initiate, sequential chunks, finalize.

use docupload_protocol::{
    FinalizeUploadRequest, InitiateUploadRequest, ProcessedDocument, UploadChunkRequest,
};
use docupload_transfer::{ProgressReporter, ProgressStage, UploadSession, encode, slice};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{IngestionBackend, with_timeout};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::types::UploadSpec;

/// Drives one chunked upload attempt against a backend.
pub struct ChunkedUpload<'a> {
    backend: &'a dyn IngestionBackend,
    config: &'a UploadConfig,
    cancel: CancellationToken,
}

impl<'a> ChunkedUpload<'a> {
    pub fn new(
        backend: &'a dyn IngestionBackend,
        config: &'a UploadConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            config,
            cancel,
        }
    }

    /// Runs `session` to completion.
    ///
    /// `session` must be freshly created for `spec`. On return it is in a
    /// terminal state: `Complete` on success, `Failed` or `Cancelled`
    /// otherwise. Chunks go out strictly in index order, one at a time.
    pub async fn run(
        &self,
        spec: &UploadSpec,
        session: &mut UploadSession,
        progress: &ProgressReporter,
    ) -> Result<ProcessedDocument, UploadError> {
        let plan = *session.plan();
        let total_size = plan.total_size();
        let total_chunks = plan.total_chunks();

        // 1. Initiate
        self.check_cancelled(session)?;
        let req = InitiateUploadRequest {
            file_name: spec.file_name.clone(),
            total_chunks,
            total_size,
            mime_type: spec.mime_type.clone(),
        };
        let timeout = self.config.initiate_timeout;
        let upload_id = match with_timeout(timeout, self.backend.initiate(&req, timeout)).await {
            Ok(resp) => resp.upload_id,
            Err(e) => return Err(fail(session, UploadError::from_backend(e))),
        };
        session.initiated(upload_id.clone())?;
        info!(
            upload_id = %upload_id,
            total_chunks,
            bytes = total_size,
            "chunked upload initiated"
        );

        // 2. Chunks
        session.start_uploading()?;
        let policy = self.config.retry_policy();
        let timeout = self.config.chunk_timeout;
        for index in 0..total_chunks {
            self.check_cancelled(session)?;

            let raw = slice(&spec.bytes, &plan, index);
            let req = UploadChunkRequest {
                upload_id: upload_id.clone(),
                chunk_index: index,
                total_chunks,
                chunk_data: encode(raw),
            };

            let sent = policy
                .execute("upload_chunk", |attempt| {
                    debug!(
                        upload_id = %upload_id,
                        chunk = index,
                        attempt,
                        bytes = raw.len(),
                        "sending chunk"
                    );
                    with_timeout(timeout, self.backend.upload_chunk(&req, timeout))
                })
                .await;
            let ack = match sent {
                Ok(ack) => ack,
                Err(failure) => {
                    return Err(fail(session, UploadError::chunk_failure(index, failure)));
                }
            };
            debug!(
                upload_id = %upload_id,
                chunk = index,
                chunks_received = ack.chunks_received,
                "chunk acknowledged"
            );

            session.acknowledge(index)?;
            progress.report(
                ProgressStage::Uploading,
                session.uploaded_bytes(),
                total_size,
                format!("Uploaded part {} of {total_chunks}", index + 1),
            );
        }

        // 3. Finalize
        self.check_cancelled(session)?;
        session.start_finalizing()?;
        progress.report(
            ProgressStage::Processing,
            total_size,
            total_size,
            "Processing document...",
        );

        let req = FinalizeUploadRequest {
            upload_id: upload_id.clone(),
            original_name: spec.file_name.clone(),
        };
        let timeout = self.config.finalize_timeout(total_size);
        debug!(upload_id = %upload_id, timeout_ms = timeout.as_millis() as u64, "finalizing");
        match with_timeout(timeout, self.backend.finalize(&req, timeout)).await {
            Ok(doc) => {
                session.complete()?;
                info!(upload_id = %upload_id, file_id = %doc.details.file_id, "chunked upload complete");
                Ok(doc)
            }
            Err(e) => Err(fail(session, UploadError::FinalizeFailure(e))),
        }
    }

    fn check_cancelled(&self, session: &mut UploadSession) -> Result<(), UploadError> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        if let Err(e) = session.cancel() {
            warn!(error = %e, "could not mark session cancelled");
        }
        info!(upload_id = session.session_id().unwrap_or("-"), "upload cancelled");
        Err(UploadError::Cancelled)
    }
}

/// Moves `session` to `Failed` and hands `err` back.
fn fail(session: &mut UploadSession, err: UploadError) -> UploadError {
    if let Err(e) = session.fail(&err.to_string()) {
        warn!(error = %e, "could not mark session failed");
    }
    warn!(
        upload_id = session.session_id().unwrap_or("-"),
        error = %err,
        "chunked upload failed"
    );
    err
}
