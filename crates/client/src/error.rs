//! Upload error types.

use docupload_transfer::{RetryFailure, TransferError, Transient};

/// Failure of a single request to the ingestion backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("backend error {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("file too large for this transport: {detail}")]
    TooLarge {
        detail: String,
        suggestion: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Transient for BackendError {
    fn is_transient(&self) -> bool {
        match self {
            BackendError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            BackendError::Network(_) | BackendError::Timeout => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::TooLarge { .. }
            | BackendError::Json(_)
            | BackendError::InvalidResponse(_) => false,
        }
    }
}

/// Outcome of a failed upload, as surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    TransientNetwork(#[source] BackendError),

    #[error("server rejected the request ({status}): {detail}")]
    ServerRejection { status: u16, detail: String },

    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("file too large: {detail}")]
    SizeRejection {
        detail: String,
        suggestion: Option<String>,
    },

    #[error("chunk {index} failed after {attempts} attempt(s): {source}")]
    ChunkUploadFailure {
        index: u32,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("finalize failed: {0}")]
    FinalizeFailure(#[source] BackendError),

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl UploadError {
    /// Classifies a backend failure outside the chunk loop and finalize.
    pub fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::TooLarge { detail, suggestion } => {
                UploadError::SizeRejection { detail, suggestion }
            }
            BackendError::Status { status, detail } if status >= 500 => {
                UploadError::Server { status, detail }
            }
            BackendError::Status { status, detail } => {
                UploadError::ServerRejection { status, detail }
            }
            BackendError::Json(e) => UploadError::InvalidResponse(e.to_string()),
            BackendError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
            e if e.is_transient() => UploadError::TransientNetwork(e),
            e => UploadError::InvalidResponse(e.to_string()),
        }
    }

    /// Wraps the final error of a chunk that could not be delivered.
    ///
    /// A 4xx answer is a rejection of the request, not a delivery failure,
    /// and surfaces as `ServerRejection` naming the chunk.
    pub fn chunk_failure(index: u32, failure: RetryFailure<BackendError>) -> Self {
        match failure.error {
            BackendError::Status { status, detail } if (400..500).contains(&status) => {
                UploadError::ServerRejection {
                    status,
                    detail: format!("chunk {index}: {detail}"),
                }
            }
            source => UploadError::ChunkUploadFailure {
                index,
                attempts: failure.attempts,
                source,
            },
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Validation(msg) => format!("Invalid file: {msg}."),
            UploadError::TransientNetwork(_) => {
                "Network unreachable. Check your connection and try again.".into()
            }
            UploadError::ServerRejection { detail, .. } => {
                format!("The server rejected the upload: {detail}")
            }
            UploadError::Server { .. } => {
                "Server error processing document. Please try again later.".into()
            }
            UploadError::SizeRejection { .. } => "File too large to upload.".into(),
            UploadError::ChunkUploadFailure { index, source, .. } => {
                if source.is_transient() {
                    format!(
                        "Upload interrupted at part {}: network unreachable. Please try again.",
                        index + 1
                    )
                } else {
                    format!("The server rejected part {} of the upload: {source}", index + 1)
                }
            }
            UploadError::FinalizeFailure(BackendError::Timeout) => {
                "The server took too long to process the document.".into()
            }
            UploadError::FinalizeFailure(_) => "Server error processing document.".into(),
            UploadError::InvalidResponse(_) => "Unexpected response from the server.".into(),
            UploadError::Cancelled => "Upload cancelled.".into(),
            UploadError::Transfer(e) => format!("Internal upload error: {e}"),
        }
    }
}
