//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::ActorId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("actor {0} appears more than once in a frame")]
    DuplicateActor(ActorId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
