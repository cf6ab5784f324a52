use tm_messenger::MessengerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control stage wiring error: {0}")]
    Messenger(#[from] MessengerError),
}

pub type ControlResult<T> = Result<T, ControlError>;
