//! `tm-stage` — the stage contract and the machinery that runs stages.
//!
//! # Per-stage cycle
//!
//! ```text
//! loop until shutdown:
//!   ① Receive — data_receiver(timeout): newest upstream frame, or the last
//!               one again if nothing newer arrived within the timeout.
//!   ② Policy  — StalenessPolicy decides whether a long stale streak only
//!               alerts or suspends ③ and ④.
//!   ③ Action  — action(reception): build this stage's output.
//!   ④ Send    — data_sender(): publish downstream / dispatch to backend.
//! ```
//!
//! Each stage gets its own OS thread.  Stages never see each other, only
//! the messenger endpoints they were constructed with, so the only
//! synchronization between two stages is the messenger between them.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`stage`]      | `PipelineStage` trait, `Reception`                      |
//! | [`driver`]     | `StageDriver` — one cycle at a time, policy enforcement |
//! | [`runner`]     | `StageRunner` — a driver on its own thread              |
//! | [`shutdown`]   | `ShutdownFlag`                                          |
//! | [`stats`]      | `StageStats`, `StatsSnapshot`                           |
//! | [`relay`]      | `RelayStage` — frame-to-frame intermediate stage        |
//! | [`pipeline`]   | `PipelineBuilder`, `Pipeline`, `RunningPipeline`        |
//! | [`error`]      | `StageError`, `StageResult<T>`                          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let planner_out = Messenger::new("planner->control");
//! let planner = RelayStage::new("planner", upstream.subscriber()?, planner_out.publisher()?, plan);
//! let control = BatchControlStage::new("control", planner_out.subscriber()?, registry, backend, cfg);
//!
//! let running = PipelineBuilder::new(StageConfig::default())
//!     .stage(planner)
//!     .stage(control)
//!     .build()?
//!     .start()?;
//! // ...
//! let reports = running.stop()?;
//! ```

pub mod driver;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod runner;
pub mod shutdown;
pub mod stage;
pub mod stats;

#[cfg(test)]
mod tests;

pub use driver::{CycleOutcome, StageDriver};
pub use error::{StageError, StageResult};
pub use pipeline::{Pipeline, PipelineBuilder, RunningPipeline, StageReport};
pub use relay::RelayStage;
pub use runner::StageRunner;
pub use shutdown::ShutdownFlag;
pub use stage::{PipelineStage, Reception};
pub use stats::{StageStats, StatsSnapshot};
