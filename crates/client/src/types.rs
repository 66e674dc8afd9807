use std::fmt;
use std::path::Path;

use bytes::Bytes;
use docupload_protocol::ProcessedDocument;
use docupload_protocol::constants::PDF_MIME_TYPE;
use serde::Serialize;

use crate::error::UploadError;

/// One document to upload. Immutable for the lifetime of an attempt.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: String,
}

impl UploadSpec {
    pub fn new(
        bytes: impl Into<Bytes>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// A PDF document.
    pub fn pdf(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Self::new(bytes, file_name, PDF_MIME_TYPE)
    }

    /// Reads `path` and infers the MIME type from its extension.
    ///
    /// `name` overrides the file name sent to the backend.
    pub async fn from_path(path: &Path, name: Option<&str>) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            UploadError::Validation(format!("cannot read {}: {e}", path.display()))
        })?;
        let file_name = match name {
            Some(n) => n.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Ok(Self::new(bytes, file_name, mime_for_path(path)))
    }

    pub fn total_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Checks what the backend would reject anyway, before any request.
    pub fn validate(&self, accepted_mime_type: &str) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Validation("file is empty".into()));
        }
        if self.file_name.trim().is_empty() {
            return Err(UploadError::Validation("file name is empty".into()));
        }
        if self.mime_type != accepted_mime_type {
            return Err(UploadError::Validation(format!(
                "unsupported file type {} (expected {accepted_mime_type})",
                self.mime_type
            )));
        }
        Ok(())
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_MIME_TYPE,
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// How a document reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Direct,
    Chunked,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Direct => f.write_str("direct"),
            Transport::Chunked => f.write_str("chunked"),
        }
    }
}

/// Successful upload outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReceipt {
    pub document_id: String,
    pub title: String,
    pub file_url: String,
    /// Text passages the backend produced from the document.
    pub passage_count: u64,
    pub processing_time_seconds: f64,
    pub transport: Transport,
    /// Full server response, for callers that need fields not mapped here.
    pub metadata: serde_json::Value,
}

impl DocumentReceipt {
    pub(crate) fn new(doc: ProcessedDocument, title: &str, transport: Transport) -> Self {
        let metadata = serde_json::to_value(&doc).unwrap_or(serde_json::Value::Null);
        let details = doc.details;
        Self {
            document_id: details.file_id.to_string(),
            title: title.to_string(),
            file_url: details.file_url,
            passage_count: details.total_chunks,
            processing_time_seconds: details.processing_time_seconds,
            transport,
            metadata,
        }
    }
}
