//! Lock-free per-stage counters.
//!
//! Written only by the stage's own runner thread and read by anyone holding
//! the `Arc`.  Each counter sits on its own cache line so readers polling
//! one counter don't bounce the line the runner is writing.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

use crate::Reception;

#[derive(Default, Debug)]
pub struct StageStats {
    cycles:    CachePadded<AtomicU64>,
    fresh:     CachePadded<AtomicU64>,
    stale:     CachePadded<AtomicU64>,
    empty:     CachePadded<AtomicU64>,
    suspended: CachePadded<AtomicU64>,
}

/// Point-in-time copy of a stage's counters.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct StatsSnapshot {
    /// Completed receive phases.
    pub cycles:    u64,
    pub fresh:     u64,
    pub stale:     u64,
    pub empty:     u64,
    /// Cycles whose action and send phases were skipped by the staleness
    /// policy.
    pub suspended: u64,
}

impl StageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, reception: Reception) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        let counter = match reception {
            Reception::Fresh(_) => &self.fresh,
            Reception::Stale(_) => &self.stale,
            Reception::Empty    => &self.empty,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suspended(&self) {
        self.suspended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles:    self.cycles.load(Ordering::Relaxed),
            fresh:     self.fresh.load(Ordering::Relaxed),
            stale:     self.stale.load(Ordering::Relaxed),
            empty:     self.empty.load(Ordering::Relaxed),
            suspended: self.suspended.load(Ordering::Relaxed),
        }
    }
}
