use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// Callback invoked with upload progress.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Phase of an upload attempt, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Preparing,
    Uploading,
    Processing,
    Complete,
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressStage::Preparing => "preparing",
            ProgressStage::Uploading => "uploading",
            ProgressStage::Processing => "processing",
            ProgressStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: u64,
    pub percentage: u8,
    pub stage: ProgressStage,
    pub message: String,
}

impl ProgressEvent {
    /// Builds an event, deriving `percentage` from the byte counters.
    pub fn new(stage: ProgressStage, loaded: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            loaded,
            total,
            percentage: percentage(loaded, total),
            stage,
            message: message.into(),
        }
    }
}

/// `round(loaded * 100 / total)`, clamped to `0..=100`. Zero when `total` is zero.
pub fn percentage(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let loaded = u128::from(loaded.min(total));
    let total = u128::from(total);
    ((loaded * 100 + total / 2) / total) as u8
}

/// Delivers [`ProgressEvent`]s to the UI layer.
///
/// Cheap to clone; clones share the same callback and last-event slot.
/// A panicking callback is contained and logged so it can never abort an
/// upload.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: Arc<Mutex<Option<ProgressEvent>>>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .field("last", &self.last())
            .finish()
    }
}

impl ProgressReporter {
    /// Reports through `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Discards every event (the last one is still remembered).
    pub fn silent() -> Self {
        Self {
            callback: None,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Reports into an unbounded channel for async consumers.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self::new(move |event| {
            // Receiver gone means nobody is watching any more.
            let _ = tx.send(event);
        });
        (reporter, rx)
    }

    /// Emits `event`.
    pub fn emit(&self, event: ProgressEvent) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(event.clone());
        }
        let Some(callback) = &self.callback else {
            return;
        };
        let stage = event.stage;
        if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
            warn!(%stage, "progress callback panicked");
        }
    }

    /// Shorthand for `emit(ProgressEvent::new(..))`.
    pub fn report(&self, stage: ProgressStage, loaded: u64, total: u64, message: impl Into<String>) {
        self.emit(ProgressEvent::new(stage, loaded, total, message));
    }

    /// The most recently emitted event.
    pub fn last(&self) -> Option<ProgressEvent> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}
