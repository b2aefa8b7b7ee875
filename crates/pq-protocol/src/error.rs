use thiserror::Error;

/// Errors raised while building or encoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid run id: {0}")]
    InvalidRunId(String),
}
