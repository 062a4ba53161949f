//! Error types for the message model

use thiserror::Error;

/// Result type for message operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or decoding messages
#[derive(Error, Debug)]
pub enum Error {
    /// A batch index referenced a part that does not exist
    #[error("message part {index} does not exist (batch of {length})")]
    PartNotExist { index: usize, length: usize },

    /// The wire bytes of a batch were malformed
    #[error("malformed message encoding: {0}")]
    Decode(String),

    /// A payload could not be parsed as, or a value rendered to, JSON
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
