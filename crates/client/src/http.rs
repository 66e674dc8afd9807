//! Ingestion backend client over HTTP.
//!
//! Async client using `reqwest`; one JSON route per upload phase plus a
//! multipart route for direct uploads.

use std::time::Duration;

use docupload_protocol::constants::{
    DEFAULT_BASE_URL, DIRECT_FILE_FIELD, DIRECT_NAME_FIELD, SIZE_REJECTION_STATUS,
};
use docupload_protocol::{
    ChunkUploadResponse, Endpoint, ErrorBody, FinalizeUploadRequest, InitiateUploadRequest,
    InitiateUploadResponse, ProcessedDocument, UploadChunkRequest,
};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{BackendFuture, IngestionBackend};
use crate::error::BackendError;
use crate::types::UploadSpec;

const USER_AGENT: &str = concat!("docupload/", env!("CARGO_PKG_VERSION"));

/// Ingestion backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for the document routes under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Client for a backend on the default local address.
    pub fn local() -> Result<Self, BackendError> {
        Self::new(DEFAULT_BASE_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `body` as JSON and decodes the response.
    async fn post_json<B, T>(
        &self,
        endpoint: Endpoint,
        body: &B,
        timeout: Duration,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint.url(&self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest)?;
        debug!(url = %url, status = resp.status().as_u16(), "backend response");
        parse_response(resp).await
    }
}

/// Maps a non-2xx status to a typed error, otherwise decodes `T`.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(classify_reqwest)?;

    if !status.is_success() {
        let parsed = serde_json::from_slice::<ErrorBody>(&body).ok();
        let suggestion = parsed.as_ref().and_then(|b| b.suggestion.clone());
        let detail = parsed
            .map(|b| b.detail_text())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());

        if status.as_u16() == SIZE_REJECTION_STATUS {
            return Err(BackendError::TooLarge { detail, suggestion });
        }
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

fn classify_reqwest(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_connect() {
        BackendError::Network(err.to_string())
    } else {
        BackendError::Http(err)
    }
}

impl IngestionBackend for HttpBackend {
    fn direct_upload<'a>(
        &'a self,
        spec: &'a UploadSpec,
        timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument> {
        Box::pin(async move {
            let part = Part::stream_with_length(spec.bytes.clone(), spec.total_size())
                .file_name(spec.file_name.clone())
                .mime_str(&spec.mime_type)?;
            let form = Form::new()
                .part(DIRECT_FILE_FIELD, part)
                .text(DIRECT_NAME_FIELD, spec.file_name.clone());

            let url = Endpoint::Direct.url(&self.base_url);
            let resp = self
                .http
                .post(&url)
                .multipart(form)
                .timeout(timeout)
                .send()
                .await
                .map_err(classify_reqwest)?;
            debug!(url = %url, status = resp.status().as_u16(), "backend response");
            parse_response(resp).await
        })
    }

    fn initiate<'a>(
        &'a self,
        req: &'a InitiateUploadRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, InitiateUploadResponse> {
        Box::pin(self.post_json(Endpoint::Initiate, req, timeout))
    }

    fn upload_chunk<'a>(
        &'a self,
        req: &'a UploadChunkRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, ChunkUploadResponse> {
        Box::pin(self.post_json(Endpoint::UploadChunk, req, timeout))
    }

    fn finalize<'a>(
        &'a self,
        req: &'a FinalizeUploadRequest,
        timeout: Duration,
    ) -> BackendFuture<'a, ProcessedDocument> {
        Box::pin(self.post_json(Endpoint::Finalize, req, timeout))
    }
}
