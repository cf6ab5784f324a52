use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::utils::CachePadded;

/// Cheaply clonable teardown signal shared by every runner of a pipeline.
///
/// Runners poll it between cycles, never inside one, so a cycle that has
/// started always finishes its send phase.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct ShutdownFlag(Arc<CachePadded<AtomicBool>>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline(always)]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ShutdownFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownFlag")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
