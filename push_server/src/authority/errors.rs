use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("Could not connect to the message broker. {0}")]
    ConnectionError(String),
    #[error("No reply from the authority within {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("The authority is unavailable. {0}")]
    Unavailable(String),
    #[error("The authority replied with an error. {0}")]
    Remote(String),
    #[error("Could not (de)serialize an authority message. {0}")]
    Serialization(String),
    #[error("Correlation id {0} is already pending")]
    DuplicateCorrelationId(String),
}
