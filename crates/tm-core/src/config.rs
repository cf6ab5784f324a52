//! Per-stage runtime configuration.
//!
//! Loaded by the application (TOML, env, hard-coded) and handed to the
//! pipeline builder.  Nothing here reads files.

use std::time::Duration;

use crate::{CoreError, CoreResult};

/// What the stage runner does once a stage has seen more consecutive stale
/// receptions than [`StalenessPolicy::max_consecutive_stale`] allows.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StaleAction {
    /// Log a warning once per stale streak and keep cycling on old data.
    #[default]
    Alert,
    /// Log, then skip the action and send phases until fresh data arrives.
    /// Downstream stops receiving output derived from old frames.
    Suspend,
}

/// How long a stage may keep reusing its last frame.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StalenessPolicy {
    /// `None` tolerates stale data indefinitely.
    pub max_consecutive_stale: Option<u32>,
    pub on_exceeded:           StaleAction,
}

impl StalenessPolicy {
    /// Reuse the last frame forever.
    pub const UNBOUNDED: StalenessPolicy = StalenessPolicy {
        max_consecutive_stale: None,
        on_exceeded:           StaleAction::Alert,
    };

    pub fn bounded(max_consecutive_stale: u32, on_exceeded: StaleAction) -> Self {
        Self {
            max_consecutive_stale: Some(max_consecutive_stale),
            on_exceeded,
        }
    }

    /// True once `streak` consecutive stale receptions exceed the bound.
    #[inline]
    pub fn is_exceeded(&self, streak: u32) -> bool {
        self.max_consecutive_stale.is_some_and(|max| streak > max)
    }
}

/// Settings shared by every stage runner.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageConfig {
    /// Longest a stage's receive phase waits for a newer frame before
    /// falling back to the one it already has.  Must be non-zero.
    pub receive_timeout: Duration,

    pub staleness: StalenessPolicy,

    /// Emit a throughput `debug!` line every N cycles.  0 disables.
    pub stats_log_interval: u64,
}

impl StageConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.receive_timeout.is_zero() {
            return Err(CoreError::Config(
                "receive_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            receive_timeout:    Duration::from_millis(10),
            staleness:          StalenessPolicy::UNBOUNDED,
            stats_log_interval: 1_000,
        }
    }
}
