//! The simulation backend as seen by the control stage.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use crate::{CommandBatch, VehicleCommand};

/// Aggregate failure of one `apply_batch` call.  Per-command outcomes inside
/// a batch are the backend's own business.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("backend rejected batch: {0}")]
    Rejected(String),

    #[error("backend did not acknowledge batch within {0:?}")]
    Timeout(Duration),

    #[error("backend connection lost")]
    Disconnected,
}

/// A session with the simulation backend.
///
/// `apply_batch` is the only operation the pipeline needs.  It may block for
/// as long as the backend's own timeout allows; the control stage calls it at
/// most once per cycle.
pub trait Backend: Send + 'static {
    fn apply_batch(&mut self, batch: &[VehicleCommand]) -> Result<(), BackendError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn apply_batch(&mut self, batch: &[VehicleCommand]) -> Result<(), BackendError> {
        (**self).apply_batch(batch)
    }
}

// ── RecordingBackend ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    batches:   Vec<CommandBatch>,
    /// Errors returned by the next calls, front first.
    failures:  Vec<BackendError>,
    attempts:  u64,
}

/// In-memory backend that keeps every accepted batch.
///
/// Clones share state, so one clone can be moved into the pipeline while
/// another inspects what was dispatched.  Failures can be queued with
/// [`fail_next`][Self::fail_next] to exercise the error path.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call (after any already queued failures) return `err`.
    pub fn fail_next(&self, err: BackendError) {
        self.inner.lock().failures.push(err);
    }

    /// Every batch the backend accepted, in dispatch order.
    pub fn batches(&self) -> Vec<CommandBatch> {
        self.inner.lock().batches.clone()
    }

    pub fn accepted(&self) -> usize {
        self.inner.lock().batches.len()
    }

    /// Accepted plus failed calls.
    pub fn attempts(&self) -> u64 {
        self.inner.lock().attempts
    }

    pub fn last_batch(&self) -> Option<CommandBatch> {
        self.inner.lock().batches.last().cloned()
    }
}

impl Backend for RecordingBackend {
    fn apply_batch(&mut self, batch: &[VehicleCommand]) -> Result<(), BackendError> {
        let mut rec = self.inner.lock();
        rec.attempts += 1;
        if !rec.failures.is_empty() {
            return Err(rec.failures.remove(0));
        }
        rec.batches.push(batch.to_vec());
        Ok(())
    }
}
