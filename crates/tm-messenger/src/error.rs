use tm_core::Tick;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("messenger `{0}` already has a producer")]
    ProducerClaimed(String),

    #[error("messenger `{0}` already has a consumer")]
    ConsumerClaimed(String),

    #[error("messenger `{name}`: tick {pushed} is not newer than stored tick {stored}")]
    TickRegression {
        name:   String,
        pushed: Tick,
        stored: Tick,
    },
}

pub type MessengerResult<T> = Result<T, MessengerError>;
