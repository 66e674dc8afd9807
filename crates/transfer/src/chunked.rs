use std::ops::Range;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::TransferError;

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Fixed-size split of a document into chunks.
///
/// A plan is a pure function of `(total_size, chunk_size)`, so recomputing it
/// on a retry or a restart always yields the same boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
    total_chunks: u32,
}

impl ChunkPlan {
    /// Plans `total_size` bytes in pieces of `chunk_size`.
    ///
    /// Empty documents have no valid plan: the last chunk would be empty.
    pub fn new(total_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        if total_size == 0 {
            return Err(TransferError::EmptyFile);
        }
        let total_chunks = u32::try_from(total_size.div_ceil(chunk_size))
            .map_err(|_| TransferError::TooManyChunks)?;
        Ok(Self {
            total_size,
            chunk_size,
            total_chunks,
        })
    }

    /// Total document size in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Nominal chunk size in bytes.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of chunks, `ceil(total_size / chunk_size)`.
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Byte range covered by chunk `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= total_chunks()`.
    pub fn range(&self, index: u32) -> Range<u64> {
        assert!(
            index < self.total_chunks,
            "chunk index {index} out of range (total_chunks = {})",
            self.total_chunks
        );
        let start = u64::from(index) * self.chunk_size;
        let end = (start + self.chunk_size).min(self.total_size);
        start..end
    }

    /// Length of chunk `index`: `chunk_size` except possibly for the last one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= total_chunks()`.
    pub fn chunk_len(&self, index: u32) -> u64 {
        let range = self.range(index);
        range.end - range.start
    }

    /// Bytes covered by chunks `0..=index`.
    pub fn bytes_through(&self, index: u32) -> u64 {
        self.range(index).end
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Plans `total_size` bytes in pieces of `chunk_size`.
pub fn plan(total_size: u64, chunk_size: u64) -> Result<ChunkPlan, TransferError> {
    ChunkPlan::new(total_size, chunk_size)
}

/// Returns the raw bytes of chunk `index`.
///
/// # Panics
///
/// Panics if `index` is outside the plan or `bytes` is not the document the
/// plan was computed for.
pub fn slice<'a>(bytes: &'a [u8], plan: &ChunkPlan, index: u32) -> &'a [u8] {
    assert_eq!(
        bytes.len() as u64,
        plan.total_size(),
        "document size does not match its chunk plan"
    );
    let range = plan.range(index);
    &bytes[range.start as usize..range.end as usize]
}

/// Encodes raw chunk bytes for a text-only JSON envelope (padded base64).
pub fn encode(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Reverses [`encode`].
pub fn decode(encoded: &str) -> Result<Vec<u8>, TransferError> {
    Ok(STANDARD.decode(encoded)?)
}
