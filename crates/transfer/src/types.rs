use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::TransferError;
use crate::chunked::ChunkPlan;

/// Lifecycle of a chunked upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitiated,
    Initiated,
    Uploading,
    Finalizing,
    Complete,
    Failed,
    Cancelled,
}

impl SessionState {
    /// `true` once the session can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Complete | SessionState::Failed | SessionState::Cancelled
        )
    }

    fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Uninitiated, Initiated)
                | (Initiated, Uploading)
                | (Uploading, Finalizing)
                | (Finalizing, Complete)
                | (Uninitiated | Initiated | Uploading | Finalizing, Failed)
                | (Uninitiated | Initiated | Uploading, Cancelled)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitiated => "uninitiated",
            SessionState::Initiated => "initiated",
            SessionState::Uploading => "uploading",
            SessionState::Finalizing => "finalizing",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Client-side state of one chunked upload attempt.
///
/// Acknowledged chunks only accumulate. A session is never resumed: a new
/// attempt starts from a fresh session at chunk 0.
#[derive(Debug, Clone)]
pub struct UploadSession {
    session_id: Option<String>,
    plan: ChunkPlan,
    state: SessionState,
    uploaded_chunks: BTreeSet<u32>,
    uploaded_bytes: u64,
    error: Option<String>,
}

impl UploadSession {
    /// Creates an uninitiated session for `plan`.
    pub fn new(plan: ChunkPlan) -> Self {
        Self {
            session_id: None,
            plan,
            state: SessionState::Uninitiated,
            uploaded_chunks: BTreeSet::new(),
            uploaded_bytes: 0,
            error: None,
        }
    }

    fn transition(&mut self, next: SessionState) -> Result<(), TransferError> {
        if !self.state.can_transition_to(next) {
            return Err(TransferError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(
            upload_id = self.session_id.as_deref().unwrap_or("-"),
            from = %self.state,
            to = %next,
            "session transition"
        );
        self.state = next;
        Ok(())
    }

    /// Records the id issued by the backend.
    pub fn initiated(&mut self, session_id: String) -> Result<(), TransferError> {
        self.transition(SessionState::Initiated)?;
        self.session_id = Some(session_id);
        Ok(())
    }

    /// Marks the start of chunk transmission.
    pub fn start_uploading(&mut self) -> Result<(), TransferError> {
        self.transition(SessionState::Uploading)
    }

    /// Records an acknowledged chunk. Returns `false` if it was already recorded.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the plan.
    pub fn acknowledge(&mut self, index: u32) -> Result<bool, TransferError> {
        if self.state != SessionState::Uploading {
            return Err(TransferError::InvalidTransition {
                from: self.state,
                to: SessionState::Uploading,
            });
        }
        let len = self.plan.chunk_len(index);
        if !self.uploaded_chunks.insert(index) {
            return Ok(false);
        }
        self.uploaded_bytes += len;
        trace!(chunk = index, bytes = len, uploaded = self.uploaded_bytes, "chunk acknowledged");
        Ok(true)
    }

    /// Moves to finalizing. Every chunk must have been acknowledged.
    pub fn start_finalizing(&mut self) -> Result<(), TransferError> {
        if !self.all_chunks_uploaded() {
            return Err(TransferError::IncompleteUpload {
                uploaded: self.uploaded_chunks.len() as u32,
                total: self.plan.total_chunks(),
            });
        }
        self.transition(SessionState::Finalizing)
    }

    /// Marks the session finished.
    pub fn complete(&mut self) -> Result<(), TransferError> {
        self.transition(SessionState::Complete)
    }

    /// Marks the session failed with an error message.
    pub fn fail(&mut self, err: &str) -> Result<(), TransferError> {
        self.transition(SessionState::Failed)?;
        self.error = Some(err.to_string());
        Ok(())
    }

    /// Marks the session cancelled.
    pub fn cancel(&mut self) -> Result<(), TransferError> {
        self.transition(SessionState::Cancelled)
    }

    /// Backend-issued id, once initiated.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Indices acknowledged so far, ascending.
    pub fn uploaded_chunks(&self) -> &BTreeSet<u32> {
        &self.uploaded_chunks
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    /// Error recorded by [`fail`](Self::fail).
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` when every chunk of the plan has been acknowledged.
    pub fn all_chunks_uploaded(&self) -> bool {
        self.uploaded_chunks.len() as u32 == self.plan.total_chunks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunked::plan;

    fn session(total: u64, chunk: u64) -> UploadSession {
        UploadSession::new(plan(total, chunk).unwrap())
    }

    fn uploading(total: u64, chunk: u64) -> UploadSession {
        let mut s = session(total, chunk);
        s.initiated("u1".into()).unwrap();
        s.start_uploading().unwrap();
        s
    }

    #[test]
    fn new_session_is_uninitiated() {
        let s = session(10, 4);
        assert_eq!(s.state(), SessionState::Uninitiated);
        assert!(s.session_id().is_none());
        assert_eq!(s.uploaded_bytes(), 0);
        assert!(s.uploaded_chunks().is_empty());
    }

    #[test]
    fn happy_path() {
        let mut s = uploading(10, 4);
        assert_eq!(s.session_id(), Some("u1"));
        for i in 0..3 {
            assert!(s.acknowledge(i).unwrap());
        }
        assert_eq!(s.uploaded_bytes(), 10);
        s.start_finalizing().unwrap();
        s.complete().unwrap();
        assert_eq!(s.state(), SessionState::Complete);
        assert!(s.state().is_terminal());
    }

    #[test]
    fn acknowledge_is_idempotent_by_index() {
        let mut s = uploading(10, 4);
        assert!(s.acknowledge(0).unwrap());
        assert!(!s.acknowledge(0).unwrap());
        assert_eq!(s.uploaded_bytes(), 4);
        assert_eq!(s.uploaded_chunks().len(), 1);
    }

    #[test]
    fn uploaded_bytes_never_exceed_total() {
        let mut s = uploading(10, 4);
        for i in [0, 1, 2, 2, 1] {
            s.acknowledge(i).unwrap();
            assert!(s.uploaded_bytes() <= s.plan().total_size());
        }
    }

    #[test]
    fn finalize_requires_all_chunks() {
        let mut s = uploading(10, 4);
        s.acknowledge(0).unwrap();
        assert!(matches!(
            s.start_finalizing(),
            Err(TransferError::IncompleteUpload {
                uploaded: 1,
                total: 3
            })
        ));
        assert_eq!(s.state(), SessionState::Uploading);
    }

    #[test]
    fn acknowledge_before_uploading_rejected() {
        let mut s = session(10, 4);
        assert!(matches!(
            s.acknowledge(0),
            Err(TransferError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn fail_records_error() {
        let mut s = uploading(10, 4);
        s.fail("chunk 1 failed").unwrap();
        assert_eq!(s.state(), SessionState::Failed);
        assert_eq!(s.error(), Some("chunk 1 failed"));
    }

    #[test]
    fn initiate_failure_reaches_failed() {
        let mut s = session(10, 4);
        s.fail("connection refused").unwrap();
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.session_id().is_none());
    }

    #[test]
    fn complete_is_final() {
        let mut s = uploading(4, 4);
        s.acknowledge(0).unwrap();
        s.start_finalizing().unwrap();
        s.complete().unwrap();
        assert!(s.fail("late").is_err());
        assert_eq!(s.state(), SessionState::Complete);
    }

    #[test]
    fn cancel_not_reachable_while_finalizing() {
        let mut s = uploading(4, 4);
        s.acknowledge(0).unwrap();
        s.start_finalizing().unwrap();
        assert!(s.cancel().is_err());
        assert_eq!(s.state(), SessionState::Finalizing);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut s = uploading(10, 4);
        s.cancel().unwrap();
        assert!(s.start_uploading().is_err());
        assert!(s.fail("late").is_err());
        assert_eq!(s.state(), SessionState::Cancelled);
    }

    #[test]
    fn cannot_skip_initiate() {
        let mut s = session(10, 4);
        assert!(matches!(
            s.start_uploading(),
            Err(TransferError::InvalidTransition {
                from: SessionState::Uninitiated,
                to: SessionState::Uploading
            })
        ));
    }
}
