use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens a chunked upload session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiateUploadRequest {
    pub file_name: String,
    pub total_chunks: u32,
    pub total_size: u64,
    pub mime_type: String,
}

/// Sends one chunk of a session.
///
/// `chunk_data` is already encoded for the JSON envelope (standard base64).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadChunkRequest {
    pub upload_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub chunk_data: String,
}

/// Asks the backend to assemble the session and ingest the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeUploadRequest {
    pub upload_id: String,
    pub original_name: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Session handle returned by initiate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiateUploadResponse {
    pub upload_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expires_at: String,
}

/// Acknowledgement of a single chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkUploadResponse {
    pub upload_id: String,
    pub chunks_received: u32,
    pub total_chunks: u32,
    pub is_complete: bool,
}

/// Result of a successful ingestion (direct upload or finalize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    #[serde(default)]
    pub message: String,
    pub details: ProcessingDetails,
}

/// Server-side facts about the ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingDetails {
    pub file_id: FileId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_url: String,
    /// Number of text passages the backend produced.
    #[serde(default)]
    pub total_chunks: u64,
    #[serde(default)]
    pub processing_time_seconds: f64,
}

/// Document identifier; the metadata store hands out either integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileId::Number(n) => write!(f, "{n}"),
            FileId::Text(s) => f.write_str(s),
        }
    }
}

/// Error body returned with any non-2xx status.
///
/// `detail` is a plain string for handled errors and a list of objects for
/// request validation failures, so it stays untyped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    /// Flattens `detail` into one human-readable line.
    pub fn detail_text(&self) -> String {
        match &self.detail {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
