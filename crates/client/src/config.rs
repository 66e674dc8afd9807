use std::time::Duration;

use docupload_protocol::constants::PDF_MIME_TYPE;
use docupload_transfer::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy,
};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::types::Transport;

const MIB: u64 = 1024 * 1024;

/// Largest document sent in a single request.
pub const DEFAULT_DIRECT_LIMIT: u64 = 10 * MIB;

/// Upload tuning. Fixed for the lifetime of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Documents up to and including this size try a direct upload first.
    pub direct_limit: u64,
    pub chunk_size: u64,
    /// Attempts per chunk, including the first.
    pub max_attempts: u32,
    #[serde(with = "duration_ms", rename = "retry_delay_ms")]
    pub retry_delay: Duration,
    #[serde(with = "duration_ms", rename = "finalize_base_timeout_ms")]
    pub finalize_base_timeout: Duration,
    /// Added to the finalize timeout for every started `size_bucket`.
    #[serde(with = "duration_ms", rename = "finalize_per_bucket_timeout_ms")]
    pub finalize_per_bucket_timeout: Duration,
    pub size_bucket: u64,
    #[serde(with = "duration_ms", rename = "initiate_timeout_ms")]
    pub initiate_timeout: Duration,
    #[serde(with = "duration_ms", rename = "chunk_timeout_ms")]
    pub chunk_timeout: Duration,
    #[serde(with = "duration_ms", rename = "direct_timeout_ms")]
    pub direct_timeout: Duration,
    pub accepted_mime_type: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            direct_limit: DEFAULT_DIRECT_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            finalize_base_timeout: Duration::from_secs(60),
            finalize_per_bucket_timeout: Duration::from_secs(60),
            size_bucket: 10 * MIB,
            initiate_timeout: Duration::from_secs(30),
            chunk_timeout: Duration::from_secs(60),
            direct_timeout: Duration::from_secs(120),
            accepted_mime_type: PDF_MIME_TYPE.to_string(),
        }
    }
}

impl UploadConfig {
    /// Rejects settings that would make every upload fail.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.chunk_size == 0 {
            return Err(UploadError::Validation("chunk_size must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(UploadError::Validation("max_attempts must be positive".into()));
        }
        if self.size_bucket == 0 {
            return Err(UploadError::Validation("size_bucket must be positive".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    /// `base + per_bucket * ceil(total_size / size_bucket)`.
    pub fn finalize_timeout(&self, total_size: u64) -> Duration {
        let buckets = total_size.div_ceil(self.size_bucket.max(1));
        let buckets = u32::try_from(buckets).unwrap_or(u32::MAX);
        self.finalize_base_timeout
            .saturating_add(self.finalize_per_bucket_timeout.saturating_mul(buckets))
    }

    /// Transport tried first for a document of `total_size` bytes.
    pub fn transport_for(&self, total_size: u64) -> Transport {
        if total_size <= self.direct_limit {
            Transport::Direct
        } else {
            Transport::Chunked
        }
    }
}

/// Serializes a `Duration` as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
