//! Pipeline construction, start-up and teardown.

use std::collections::HashSet;

use tm_core::StageConfig;

use crate::{PipelineStage, ShutdownFlag, StageError, StageResult, StageRunner, StatsSnapshot};

/// Per-stage summary returned by [`RunningPipeline::stop`].
#[derive(Clone, Debug)]
pub struct StageReport {
    pub name:  String,
    pub stats: StatsSnapshot,
}

/// Fluent builder for [`Pipeline`].
///
/// Stages arrive already wired: each owns the messenger endpoints it was
/// constructed with, and claiming an endpoint twice has already failed by the
/// time a stage reaches the builder.  `build` checks what is left to check
/// before any thread is spawned:
///
/// | Check                      | Error                        |
/// |----------------------------|------------------------------|
/// | at least one stage         | `StageError::Config`         |
/// | unique stage names         | `StageError::DuplicateStage` |
/// | `StageConfig::validate`    | `StageError::Core`           |
pub struct PipelineBuilder {
    config: StageConfig,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineBuilder {
    pub fn new(config: StageConfig) -> Self {
        Self { config, stages: Vec::new() }
    }

    pub fn stage<S: PipelineStage>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn boxed_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> StageResult<Pipeline> {
        if self.stages.is_empty() {
            return Err(StageError::Config("pipeline has no stages".into()));
        }
        self.config.validate()?;

        let mut names = HashSet::with_capacity(self.stages.len());
        for stage in &self.stages {
            if !names.insert(stage.name()) {
                return Err(StageError::DuplicateStage(stage.name().to_owned()));
            }
        }

        Ok(Pipeline {
            config: self.config,
            stages: self.stages,
        })
    }
}

/// A validated, not-yet-running pipeline.
pub struct Pipeline {
    config: StageConfig,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Spawn one thread per stage.
    ///
    /// If a spawn fails, the stages already started are stopped and joined
    /// before the error is returned.
    pub fn start(self) -> StageResult<RunningPipeline> {
        let shutdown = ShutdownFlag::new();
        let mut runners = Vec::with_capacity(self.stages.len());

        for stage in self.stages {
            match StageRunner::spawn(stage, &self.config, shutdown.clone()) {
                Ok(r) => runners.push(r),
                Err(e) => {
                    shutdown.trigger();
                    for r in runners {
                        let _ = r.join();
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(stages = runners.len(), "pipeline started");
        Ok(RunningPipeline { shutdown, runners })
    }
}

/// A pipeline whose stages are cycling on their own threads.
///
/// Dropping it without calling [`stop`][Self::stop] still triggers shutdown
/// and joins every thread.
pub struct RunningPipeline {
    shutdown: ShutdownFlag,
    runners:  Vec<StageRunner>,
}

impl RunningPipeline {
    /// Live counters for every stage, in build order.
    pub fn stats(&self) -> Vec<StageReport> {
        self.runners
            .iter()
            .map(|r| StageReport { name: r.name().to_owned(), stats: r.stats() })
            .collect()
    }

    pub fn shutdown_flag(&self) -> &ShutdownFlag {
        &self.shutdown
    }

    /// Signal every stage to stop after its in-flight cycle and wait for all
    /// of them.  All threads are joined even if one of them panicked; the
    /// first panic is returned.
    pub fn stop(mut self) -> StageResult<Vec<StageReport>> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> StageResult<Vec<StageReport>> {
        self.shutdown.trigger();
        let mut reports = Vec::with_capacity(self.runners.len());
        let mut first_err = None;

        for runner in self.runners.drain(..) {
            let name = runner.name().to_owned();
            match runner.join() {
                Ok(stats) => reports.push(StageReport { name, stats }),
                Err(e) => {
                    tracing::error!(stage = %name, error = %e, "stage did not stop cleanly");
                    first_err.get_or_insert(e);
                }
            }
        }

        tracing::info!(stages = reports.len(), "pipeline stopped");
        match first_err {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

impl Drop for RunningPipeline {
    fn drop(&mut self) {
        if !self.runners.is_empty() {
            let _ = self.shutdown_and_join();
        }
    }
}
