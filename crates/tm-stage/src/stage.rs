//! The `PipelineStage` trait — implemented by every stage variant.

use std::time::Duration;

use tm_core::Tick;
use tm_messenger::Pulled;

/// Outcome of a stage's receive phase.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Reception {
    /// A frame newer than the last one this stage saw.
    Fresh(Tick),
    /// Nothing newer arrived in time; the previous frame (of this tick) is
    /// reused.
    Stale(Tick),
    /// Upstream has never published.
    Empty,
}

impl Reception {
    /// Classify the result of a messenger pull.
    pub fn of(pulled: Option<&Pulled>) -> Self {
        match pulled {
            None                 => Reception::Empty,
            Some(p) if p.is_new  => Reception::Fresh(p.tick),
            Some(p)              => Reception::Stale(p.tick),
        }
    }

    #[inline]
    pub fn is_fresh(self) -> bool {
        matches!(self, Reception::Fresh(_))
    }

    pub fn tick(self) -> Option<Tick> {
        match self {
            Reception::Fresh(t) | Reception::Stale(t) => Some(t),
            Reception::Empty => None,
        }
    }
}

/// A unit of pipeline work with a three-phase cycle.
///
/// The runner calls the three phases in order, once per cycle, on the
/// stage's own thread, until the pipeline is torn down:
///
/// 1. [`data_receiver`][Self::data_receiver] pulls the newest upstream frame,
///    waiting at most `timeout`.
/// 2. [`action`][Self::action] turns it into this stage's output.  It must
///    not touch anything shared with other stages.
/// 3. [`data_sender`][Self::data_sender] publishes that output.
///
/// A stage owns the messenger endpoints it was built with and nothing else
/// from the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// struct Clamp { input: Subscriber, output: Publisher, out: Option<(Frame, Tick)>, last: Option<Pulled> }
///
/// impl PipelineStage for Clamp {
///     fn name(&self) -> &str { "clamp" }
///     fn data_receiver(&mut self, timeout: Duration) -> Reception {
///         self.last = self.input.receive(timeout);
///         Reception::of(self.last.as_ref())
///     }
///     fn action(&mut self, r: Reception) { /* build self.out from self.last */ }
///     fn data_sender(&mut self) { /* self.output.publish(..) */ }
/// }
/// ```
pub trait PipelineStage: Send + 'static {
    /// Diagnostics name; also used as the thread name.
    fn name(&self) -> &str;

    fn data_receiver(&mut self, timeout: Duration) -> Reception;

    fn action(&mut self, reception: Reception);

    fn data_sender(&mut self);

    /// Called once on the stage's thread after its last cycle.
    fn on_stop(&mut self) {}
}
