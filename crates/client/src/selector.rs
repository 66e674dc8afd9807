//! Transport selection and the direct-to-chunked fallback.
//!
//! Documents up to the direct limit go out in one request; anything larger,
//! or anything the backend rejects as too large, goes through a fresh
//! chunked session starting at chunk 0.

use std::sync::Arc;

use docupload_protocol::ProcessedDocument;
use docupload_transfer::{ProgressReporter, ProgressStage, TransferError, UploadSession, plan};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::backend::{IngestionBackend, with_timeout};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::session::ChunkedUpload;
use crate::types::{DocumentReceipt, Transport, UploadSpec};

/// Uploads documents, picking direct or chunked transport by size.
///
/// Holds no per-upload state; one selector can drive any number of
/// concurrent uploads.
pub struct TransportSelector {
    backend: Arc<dyn IngestionBackend>,
    config: UploadConfig,
}

impl TransportSelector {
    /// Creates a selector. Fails if `config` cannot produce a valid upload.
    pub fn new(backend: Arc<dyn IngestionBackend>, config: UploadConfig) -> Result<Self, UploadError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Uploads `spec`, reporting through `progress`.
    ///
    /// Emits one `Complete` event on success, after every other event.
    /// `cancel` takes effect before the direct request, between chunks and
    /// before initiate and finalize; a request already on the wire is never
    /// interrupted.
    pub async fn select_and_upload(
        &self,
        spec: &UploadSpec,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<DocumentReceipt, UploadError> {
        spec.validate(&self.config.accepted_mime_type)?;

        let total_size = spec.total_size();
        let transport = self.config.transport_for(total_size);
        info!(
            file = %spec.file_name,
            bytes = total_size,
            %transport,
            "starting upload"
        );

        let result = match transport {
            Transport::Direct => match self.upload_direct(spec, progress, cancel).await {
                Ok(doc) => Ok((doc, Transport::Direct)),
                Err(UploadError::SizeRejection { detail, .. }) => {
                    info!(
                        file = %spec.file_name,
                        detail = %detail,
                        "direct upload rejected as too large, restarting as chunked"
                    );
                    self.upload_chunked(spec, progress, cancel)
                        .await
                        .map(|doc| (doc, Transport::Chunked))
                }
                Err(e) => Err(e),
            },
            Transport::Chunked => self
                .upload_chunked(spec, progress, cancel)
                .await
                .map(|doc| (doc, Transport::Chunked)),
        };

        match result {
            Ok((doc, transport)) => {
                progress.report(ProgressStage::Complete, total_size, total_size, "Upload complete");
                let receipt = DocumentReceipt::new(doc, &spec.file_name, transport);
                info!(
                    file = %spec.file_name,
                    document_id = %receipt.document_id,
                    %transport,
                    "upload completed"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(file = %spec.file_name, error = %e, "upload failed");
                Err(e)
            }
        }
    }

    async fn upload_direct(
        &self,
        spec: &UploadSpec,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ProcessedDocument, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        progress.report(
            ProgressStage::Preparing,
            0,
            spec.total_size(),
            "Uploading document...",
        );
        let timeout = self.config.direct_timeout;
        with_timeout(timeout, self.backend.direct_upload(spec, timeout))
            .await
            .map_err(UploadError::from_backend)
    }

    async fn upload_chunked(
        &self,
        spec: &UploadSpec,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ProcessedDocument, UploadError> {
        let plan = plan(spec.total_size(), self.config.chunk_size).map_err(|e| match e {
            TransferError::EmptyFile => UploadError::Validation("file is empty".into()),
            other => UploadError::Transfer(other),
        })?;
        let mut session = UploadSession::new(plan);
        progress.report(
            ProgressStage::Preparing,
            0,
            plan.total_size(),
            format!("Preparing upload in {} parts...", plan.total_chunks()),
        );

        ChunkedUpload::new(self.backend.as_ref(), &self.config, cancel.clone())
            .run(spec, &mut session, progress)
            .await
    }
}
