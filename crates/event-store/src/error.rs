use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error("Concurrency conflict: expected version {expected}, found {actual}")]
    ConcurrencyConflict { expected: Version, actual: Version },

    /// The events handed to `append` are not a valid batch.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A stored entry could not be decoded.
    #[error("Corrupt log entry on line {line}: {source}")]
    CorruptEntry {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the log file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An earlier append failed and the log file could not be restored.
    #[error("Event log is unusable after a failed write")]
    Poisoned,

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
