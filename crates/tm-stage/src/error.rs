use tm_core::CoreError;
use tm_messenger::MessengerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("pipeline configuration error: {0}")]
    Config(String),

    #[error("two stages are named `{0}`")]
    DuplicateStage(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("messenger wiring error: {0}")]
    Messenger(#[from] MessengerError),

    #[error("failed to spawn thread for stage `{name}`: {source}")]
    Spawn {
        name:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("stage `{0}` panicked")]
    Panicked(String),
}

pub type StageResult<T> = Result<T, StageError>;
