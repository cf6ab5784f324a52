//! A stage on its own thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tm_core::StageConfig;

use crate::{
    PipelineStage, ShutdownFlag, StageDriver, StageError, StageResult, StageStats, StatsSnapshot,
};

/// Handle to a running stage thread.
pub struct StageRunner {
    name:   String,
    stats:  Arc<StageStats>,
    handle: JoinHandle<()>,
}

impl StageRunner {
    /// Spawn `stage` on a new thread named after it.  The thread cycles until
    /// `shutdown` is triggered, finishing whatever cycle is in flight.
    pub fn spawn(
        stage:    Box<dyn PipelineStage>,
        config:   &StageConfig,
        shutdown: ShutdownFlag,
    ) -> StageResult<Self> {
        let name = stage.name().to_owned();
        let mut driver = StageDriver::new(stage, config);
        let stats = Arc::clone(driver.stats());

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::info!(stage = driver.name(), "stage started");
                while !shutdown.is_triggered() {
                    driver.cycle();
                }
                let stage = driver.finish();
                tracing::info!(stage = stage.name(), "stage stopped");
            })
            .map_err(|source| StageError::Spawn { name: name.clone(), source })?;

        Ok(Self { name, stats, handle })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread to exit.  Does not trigger shutdown itself.
    pub fn join(self) -> StageResult<StatsSnapshot> {
        self.handle
            .join()
            .map_err(|_| StageError::Panicked(self.name.clone()))?;
        Ok(self.stats.snapshot())
    }
}
