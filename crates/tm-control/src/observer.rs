//! Observer hooks for the control stage.

use tm_core::{ActorId, Tick};

use crate::BackendError;

/// Callbacks invoked by [`BatchControlStage`][crate::BatchControlStage] on
/// its own thread.
///
/// All methods default to no-ops, so implementors override only what they
/// care about.  Every event is also logged through `tracing`; the observer
/// exists for callers that need the events as data (metrics, tests).
///
/// # Example — dispatch failure counter
///
/// ```rust,ignore
/// struct Failures(Arc<AtomicU64>);
///
/// impl ControlObserver for Failures {
///     fn on_dispatch_failed(&mut self, _tick: Tick, _len: usize, _err: &BackendError) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait ControlObserver: Send + 'static {
    /// A frame named an actor that is no longer registered.  The record was
    /// skipped; the rest of the tick continues.
    fn on_unknown_actor(&mut self, _tick: Tick, _actor: ActorId) {}

    /// A fresh frame was translated into a batch of `len` commands.
    fn on_batch_built(&mut self, _tick: Tick, _len: usize) {}

    /// No fresh frame arrived; the previous batch will be sent again.
    fn on_batch_reused(&mut self, _tick: Tick, _len: usize) {}

    fn on_dispatched(&mut self, _tick: Tick, _len: usize) {}

    /// The backend rejected or failed to acknowledge the whole batch.  The
    /// batch has been discarded.
    fn on_dispatch_failed(&mut self, _tick: Tick, _len: usize, _err: &BackendError) {}
}

/// A [`ControlObserver`] that does nothing.
pub struct NoopObserver;

impl ControlObserver for NoopObserver {}
