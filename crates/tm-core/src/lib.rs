//! `tm-core` — foundational types for the traffic-manager control pipeline.
//!
//! Every other `tm-*` crate depends on this one.  It has no `tm-*`
//! dependencies and only small external ones (`thiserror`, `parking_lot`,
//! plus optional `serde` and `rustc-hash`).
//!
//! # What lives here
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`ids`]        | `ActorId`                                                 |
//! | [`time`]       | `Tick` — per-tick token carried through every messenger   |
//! | [`control`]    | `ActorControlRecord`, `ControlFlags`                      |
//! | [`frame`]      | `Frame`, `FrameBuilder`, `TickedFrame`                    |
//! | [`registry`]   | `Registry` trait, `SharedRegistry`                        |
//! | [`config`]     | `StageConfig`, `StalenessPolicy`, `StaleAction`           |
//! | [`error`]      | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `serde`   | Adds `Serialize`/`Deserialize` to all public types.      |
//! | `fx-hash` | FxHash sets for the registry and frame validation.       |

pub mod config;
pub mod control;
pub mod error;
pub mod frame;
pub mod ids;
pub mod registry;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{StageConfig, StaleAction, StalenessPolicy};
pub use control::{ActorControlRecord, ControlFlags};
pub use error::{CoreError, CoreResult};
pub use frame::{Frame, FrameBuilder, TickedFrame};
pub use ids::ActorId;
pub use registry::{Registry, SharedRegistry};
pub use time::Tick;

// ── Hash set selection ────────────────────────────────────────────────────────

#[cfg(feature = "fx-hash")]
pub(crate) type IdSet = rustc_hash::FxHashSet<ActorId>;

#[cfg(not(feature = "fx-hash"))]
pub(crate) type IdSet = std::collections::HashSet<ActorId>;
