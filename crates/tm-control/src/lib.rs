//! `tm-control` — the last stage of the pipeline.
//!
//! [`BatchControlStage`] reads the motion planner's final frame, turns each
//! record into a [`VehicleCommand`], and hands the whole tick's commands to
//! the simulation [`Backend`] in a single `apply_batch` call.  One call per
//! tick instead of one per actor is what keeps the per-tick cost flat as the
//! vehicle population grows.
//!
//! # Per-tick behavior
//!
//! | Reception | Action                                              | Send                    |
//! |-----------|-----------------------------------------------------|-------------------------|
//! | fresh     | rebuild batch; skip actors no longer registered     | one `apply_batch`       |
//! | stale     | reuse previous batch (if `resend_on_stale`)         | one `apply_batch`       |
//! | empty     | nothing                                             | nothing                 |
//!
//! A failed dispatch is logged and reported to the [`ControlObserver`]; the
//! batch is discarded, never retried.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Translate records on Rayon's thread pool.                |
//! | `serde`    | Serde derives on `VehicleControl` and `VehicleCommand`.  |

pub mod backend;
pub mod command;
pub mod error;
pub mod observer;
pub mod stage;


pub use backend::{Backend, BackendError, RecordingBackend};
pub use command::{CommandBatch, VehicleCommand, VehicleControl};
pub use error::{ControlError, ControlResult};
pub use observer::{ControlObserver, NoopObserver};
pub use stage::{BatchControlConfig, BatchControlStage};
