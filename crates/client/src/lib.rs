//! Document upload client for the ingestion backend.
//!
//! Library crate with no UI: callers hand a [`TransportSelector`] an
//! [`UploadSpec`] and a [`ProgressReporter`](docupload_transfer::ProgressReporter)
//! and get back a [`DocumentReceipt`] or a typed [`UploadError`].
//!
//! # Pipeline
//!
//! 1. **Validate**: reject empty files and unsupported types before any request
//! 2. **Select**: direct upload up to the direct limit, chunked above it
//! 3. **Direct**: one multipart request; a size rejection restarts as chunked
//! 4. **Chunked**: initiate, upload chunks in order with retry, finalize

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod selector;
pub mod session;
pub mod types;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use backend::{BackendFuture, IngestionBackend};
pub use config::{DEFAULT_DIRECT_LIMIT, UploadConfig};
pub use error::{BackendError, UploadError};
pub use http::HttpBackend;
pub use selector::TransportSelector;
pub use session::ChunkedUpload;
pub use types::{DocumentReceipt, Transport, UploadSpec};
