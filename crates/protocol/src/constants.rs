/// Default base URL of the document routes.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/documents";

/// The only document type the ingestion backend accepts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Multipart field carrying the file bytes in a direct upload.
pub const DIRECT_FILE_FIELD: &str = "file";

/// Multipart field carrying the document title in a direct upload.
pub const DIRECT_NAME_FIELD: &str = "original_name";

/// HTTP status the backend uses to say "too large, use chunked upload".
pub const SIZE_REJECTION_STATUS: u16 = 413;

/// Upload routes exposed by the ingestion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Single-request multipart upload.
    Direct,
    /// Opens a chunked upload session.
    Initiate,
    /// Appends one chunk to a session.
    UploadChunk,
    /// Assembles the chunks and runs ingestion.
    Finalize,
}

impl Endpoint {
    /// Path relative to the base URL (the backend expects the trailing slash).
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Direct => "/upload_document/",
            Endpoint::Initiate => "/initiate_chunked_upload/",
            Endpoint::UploadChunk => "/upload_chunk/",
            Endpoint::Finalize => "/finalize_chunked_upload/",
        }
    }

    /// Joins the endpoint path onto `base_url`, tolerating a trailing slash.
    pub fn url(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}
