//! Runs one stage one cycle at a time and applies the staleness policy.
//!
//! [`StageRunner`][crate::StageRunner] wraps a driver in a thread; tests
//! drive it directly for deterministic cycle-by-cycle control.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tm_core::{StageConfig, StaleAction, StalenessPolicy};

use crate::{PipelineStage, Reception, StageStats};

/// What happened during one call to [`StageDriver::cycle`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CycleOutcome {
    /// All three phases ran.
    Ran(Reception),
    /// Only the receive phase ran; the policy withheld action and send.
    Suspended(Reception),
}

pub struct StageDriver {
    stage:        Box<dyn PipelineStage>,
    timeout:      Duration,
    policy:       StalenessPolicy,
    log_interval: u64,
    stats:        Arc<StageStats>,
    /// Consecutive non-fresh receptions.
    stale_streak: u32,
    /// Whether the current streak has already been reported.
    alerted:      bool,
    started:      Instant,
}

impl StageDriver {
    pub fn new(stage: Box<dyn PipelineStage>, config: &StageConfig) -> Self {
        Self {
            stage,
            timeout:      config.receive_timeout,
            policy:       config.staleness,
            log_interval: config.stats_log_interval,
            stats:        Arc::new(StageStats::new()),
            stale_streak: 0,
            alerted:      false,
            started:      Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        self.stage.name()
    }

    pub fn stats(&self) -> &Arc<StageStats> {
        &self.stats
    }

    pub fn stale_streak(&self) -> u32 {
        self.stale_streak
    }

    /// Run one receive / action / send cycle.
    pub fn cycle(&mut self) -> CycleOutcome {
        let reception = self.stage.data_receiver(self.timeout);
        self.stats.record(reception);

        let suspend = self.apply_policy(reception);
        let outcome = if suspend {
            self.stats.record_suspended();
            CycleOutcome::Suspended(reception)
        } else {
            self.stage.action(reception);
            self.stage.data_sender();
            CycleOutcome::Ran(reception)
        };

        self.maybe_log_throughput();
        outcome
    }

    /// Hand control back to the stage for teardown.
    pub fn finish(mut self) -> Box<dyn PipelineStage> {
        self.stage.on_stop();
        self.stage
    }

    // ── Staleness policy ──────────────────────────────────────────────────

    /// Update the stale streak and return whether action/send must be
    /// skipped this cycle.
    fn apply_policy(&mut self, reception: Reception) -> bool {
        if reception.is_fresh() {
            if self.alerted {
                tracing::info!(
                    stage = self.stage.name(),
                    after = self.stale_streak,
                    "fresh data resumed"
                );
            }
            self.stale_streak = 0;
            self.alerted = false;
            return false;
        }

        self.stale_streak = self.stale_streak.saturating_add(1);
        if !self.policy.is_exceeded(self.stale_streak) {
            return false;
        }

        if !self.alerted {
            self.alerted = true;
            tracing::warn!(
                stage  = self.stage.name(),
                streak = self.stale_streak,
                last   = ?reception.tick(),
                action = ?self.policy.on_exceeded,
                "upstream data exceeded staleness bound"
            );
        }
        self.policy.on_exceeded == StaleAction::Suspend
    }

    fn maybe_log_throughput(&self) {
        if self.log_interval == 0 {
            return;
        }
        let cycles = self.stats.cycles();
        if !cycles.is_multiple_of(self.log_interval) {
            return;
        }
        let s = self.stats.snapshot();
        let secs = self.started.elapsed().as_secs_f64().max(f64::EPSILON);
        tracing::debug!(
            stage     = self.stage.name(),
            cycles    = s.cycles,
            fresh     = s.fresh,
            stale     = s.stale,
            suspended = s.suspended,
            per_sec   = s.cycles as f64 / secs,
            "stage throughput"
        );
    }
}
