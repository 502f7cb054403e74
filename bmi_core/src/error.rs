//! Error types for the bmi_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bmi_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Weight, height or user name the caller should correct
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A user with this name is already on record
    #[error("User '{0}' already exists")]
    AlreadyExists(String),

    /// Operation referenced a user that is not on record
    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    /// The database file could not be opened or queried
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    /// A persisted row could not be decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
