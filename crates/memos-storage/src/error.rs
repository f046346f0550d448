//! Storage layer error types.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Open/read/write/truncate/seek on the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted content is not a valid memo array
    #[error("Decode error: {0}")]
    Decode(String),

    /// Memo set could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// The highest stored id leaves no room for another memo
    #[error("No memo id left after {0}")]
    IdExhausted(u64),

    /// A previous holder of the store lock panicked
    #[error("Store lock poisoned")]
    Poisoned,
}
