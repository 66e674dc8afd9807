//! Chunked upload building blocks: chunk planning and encoding, retry
//! policy, progress reporting and the session state machine.
//!
//! Nothing here performs I/O; the client crate drives these pieces against
//! the ingestion backend.

mod chunked;
mod progress;
mod retry;
mod types;

pub use chunked::{ChunkPlan, decode, encode, plan, slice};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter, ProgressStage, percentage};
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryFailure, RetryPolicy, Transient};
pub use types::{SessionState, UploadSession};

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("file is empty")]
    EmptyFile,

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("file needs more chunks than the protocol can address")]
    TooManyChunks,

    #[error("invalid chunk encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("only {uploaded} of {total} chunks uploaded")]
    IncompleteUpload { uploaded: u32, total: u32 },
}
