//! Error types for the spool buffer

use thiserror::Error;

/// Result type for spool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while operating a spool buffer
#[derive(Error, Debug)]
pub enum Error {
    /// The buffer has been closed; no further operations are accepted
    #[error("buffer is closed")]
    Closed,

    /// Error surfaced verbatim from the backing store
    #[error("store error: {0}")]
    Store(#[from] fjall::Error),

    /// A taken record could not be decoded as a message batch
    #[error("decode record: {0}")]
    Codec(#[from] sluice_message::Error),

    /// A key in the pending list had no record in the store
    #[error("record {0} missing from store")]
    MissingRecord(String),

    /// Filesystem error while preparing the store directory
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
