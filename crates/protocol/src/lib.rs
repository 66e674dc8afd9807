//! Wire types for the document ingestion backend.
//!
//! The backend speaks JSON over HTTP with `snake_case` field names. Every
//! request and response body the uploader touches is modelled here so the
//! client and the compatibility tests share one definition.

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::Endpoint;
pub use messages::{
    ChunkUploadResponse, ErrorBody, FileId, FinalizeUploadRequest, InitiateUploadRequest,
    InitiateUploadResponse, ProcessedDocument, ProcessingDetails, UploadChunkRequest,
};
