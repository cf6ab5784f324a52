//! `BatchControlStage` — frame in, one backend batch out.

use std::sync::Arc;
use std::time::Duration;

use tm_core::{ActorId, Frame, Registry, Tick};
use tm_messenger::{Messenger, Pulled, Subscriber};
use tm_stage::{PipelineStage, Reception};

use crate::{
    Backend, CommandBatch, ControlObserver, ControlResult, NoopObserver, VehicleCommand,
};

/// Settings specific to the control stage.  Receive timeout and staleness
/// bound come from the pipeline's `StageConfig`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchControlConfig {
    /// When no fresh frame arrived, dispatch the previous batch again instead
    /// of sending nothing.  Default: `true`.
    pub resend_on_stale: bool,
}

impl Default for BatchControlConfig {
    fn default() -> Self {
        Self { resend_on_stale: true }
    }
}

/// Terminal stage: translates the planner's frame into a [`CommandBatch`]
/// and dispatches it with one [`Backend::apply_batch`] call per cycle.
///
/// The batch is owned by the stage and reused across ticks so its
/// allocation is amortised; it is cleared on every fresh frame and after
/// every failed dispatch.
pub struct BatchControlStage<B: Backend, O: ControlObserver = NoopObserver> {
    name:     String,
    input:    Subscriber,
    registry: Arc<dyn Registry>,
    backend:  B,
    observer: O,
    config:   BatchControlConfig,

    received:   Option<Pulled>,
    batch:      CommandBatch,
    batch_tick: Option<Tick>,
    /// Set by `action`, consumed by `data_sender`.
    dispatch:   bool,

    dispatches:      u64,
    failures:        u64,
    skipped_records: u64,
}

impl<B: Backend> BatchControlStage<B, NoopObserver> {
    pub fn new(
        name:     impl Into<String>,
        input:    Subscriber,
        registry: Arc<dyn Registry>,
        backend:  B,
        config:   BatchControlConfig,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            registry,
            backend,
            observer: NoopObserver,
            config,
            received:        None,
            batch:           CommandBatch::new(),
            batch_tick:      None,
            dispatch:        false,
            dispatches:      0,
            failures:        0,
            skipped_records: 0,
        }
    }

    /// Claim `messenger`'s consumer endpoint and build the stage on it.
    pub fn connect(
        name:      impl Into<String>,
        messenger: &Arc<Messenger>,
        registry:  Arc<dyn Registry>,
        backend:   B,
        config:    BatchControlConfig,
    ) -> ControlResult<Self> {
        Ok(Self::new(name, messenger.subscriber()?, registry, backend, config))
    }
}

impl<B: Backend, O: ControlObserver> BatchControlStage<B, O> {
    /// Replace the observer.
    pub fn with_observer<O2: ControlObserver>(self, observer: O2) -> BatchControlStage<B, O2> {
        BatchControlStage {
            name:            self.name,
            input:           self.input,
            registry:        self.registry,
            backend:         self.backend,
            observer,
            config:          self.config,
            received:        self.received,
            batch:           self.batch,
            batch_tick:      self.batch_tick,
            dispatch:        self.dispatch,
            dispatches:      self.dispatches,
            failures:        self.failures,
            skipped_records: self.skipped_records,
        }
    }

    /// The batch currently held: the one last built or reused, or empty
    /// after a failed dispatch.
    pub fn last_batch(&self) -> &[VehicleCommand] {
        &self.batch
    }

    /// Successful `apply_batch` calls.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches
    }

    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Records skipped because their actor was no longer registered.
    pub fn skipped_record_count(&self) -> u64 {
        self.skipped_records
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    // ── Action helpers ────────────────────────────────────────────────────

    fn rebuild(&mut self, tick: Tick) {
        self.batch.clear();
        self.batch_tick = Some(tick);

        // `received` is always set when the reception was fresh.
        let Some(pulled) = self.received.as_ref() else {
            return;
        };
        let frame = Arc::clone(&pulled.frame);

        let hint = frame.len().min(self.registry.count());
        self.batch.reserve(hint);

        let unknown = translate(&frame, self.registry.as_ref(), &mut self.batch);
        for actor in unknown {
            self.report_unknown(tick, actor);
        }
        self.observer.on_batch_built(tick, self.batch.len());
    }

    fn reuse(&mut self, tick: Tick) {
        // Actors may have been deregistered since the batch was built.
        let registry = Arc::clone(&self.registry);
        let mut gone = Vec::new();
        self.batch.retain(|c| {
            let keep = registry.is_registered(c.actor);
            if !keep {
                gone.push(c.actor);
            }
            keep
        });
        for actor in gone {
            self.report_unknown(tick, actor);
        }
        self.observer.on_batch_reused(tick, self.batch.len());
    }

    fn report_unknown(&mut self, tick: Tick, actor: ActorId) {
        self.skipped_records += 1;
        tracing::warn!(stage = %self.name, %tick, %actor, "skipping unregistered actor");
        self.observer.on_unknown_actor(tick, actor);
    }
}

/// Append one command per registered record to `out`, in frame order, and
/// return the ids of records whose actor is no longer registered.
#[cfg(not(feature = "parallel"))]
fn translate(frame: &Frame, registry: &dyn Registry, out: &mut CommandBatch) -> Vec<ActorId> {
    let mut unknown = Vec::new();
    for record in frame {
        if registry.is_registered(record.actor) {
            out.push(VehicleCommand::from(record));
        } else {
            unknown.push(record.actor);
        }
    }
    unknown
}

/// Parallel variant.  Rayon's indexed `collect` keeps frame order.
#[cfg(feature = "parallel")]
fn translate(frame: &Frame, registry: &dyn Registry, out: &mut CommandBatch) -> Vec<ActorId> {
    use rayon::prelude::*;

    let translated: Vec<Result<VehicleCommand, ActorId>> = frame
        .records()
        .par_iter()
        .map(|record| {
            if registry.is_registered(record.actor) {
                Ok(VehicleCommand::from(record))
            } else {
                Err(record.actor)
            }
        })
        .collect();

    let mut unknown = Vec::new();
    for t in translated {
        match t {
            Ok(cmd)    => out.push(cmd),
            Err(actor) => unknown.push(actor),
        }
    }
    unknown
}

impl<B: Backend, O: ControlObserver> PipelineStage for BatchControlStage<B, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_receiver(&mut self, timeout: Duration) -> Reception {
        self.received = self.input.receive(timeout);
        Reception::of(self.received.as_ref())
    }

    fn action(&mut self, reception: Reception) {
        self.dispatch = match reception {
            Reception::Fresh(tick) => {
                self.rebuild(tick);
                !self.batch.is_empty()
            }
            Reception::Stale(tick) if self.config.resend_on_stale && !self.batch.is_empty() => {
                self.reuse(tick);
                !self.batch.is_empty()
            }
            Reception::Stale(_) | Reception::Empty => false,
        };
    }

    fn data_sender(&mut self) {
        if !std::mem::take(&mut self.dispatch) {
            return;
        }
        let tick = self.batch_tick.unwrap_or_default();
        let len = self.batch.len();

        match self.backend.apply_batch(&self.batch) {
            Ok(()) => {
                self.dispatches += 1;
                tracing::trace!(stage = %self.name, %tick, commands = len, "batch applied");
                self.observer.on_dispatched(tick, len);
            }
            Err(e) => {
                self.failures += 1;
                tracing::error!(
                    stage    = %self.name,
                    %tick,
                    commands = len,
                    error    = %e,
                    "batch dispatch failed; discarding batch"
                );
                self.observer.on_dispatch_failed(tick, len, &e);
                self.batch.clear();
            }
        }
    }

    fn on_stop(&mut self) {
        tracing::info!(
            stage      = %self.name,
            dispatches = self.dispatches,
            failures   = self.failures,
            skipped    = self.skipped_records,
            "control stage stopped"
        );
    }
}
