//! Core error types for focusflow-core.
//!
//! Errors are split by where they come from: resolving a session plan
//! (configuration errors), talking to a store (persistence errors), and
//! loading the TOML configuration. Timer transitions never fail; an invalid
//! transition is a no-op.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A custom session referenced by id does not exist in the session store.
    #[error("Custom session '{session_id}' not found")]
    SessionNotFound { session_id: String },

    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by session and task stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query execution failed
    #[error("Query failed: {0}")]
    Database(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The backing service refused or could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded
    #[error("Failed to decode stored {what}: {message}")]
    Serialization { what: String, message: String },

    /// A referenced record does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A session must contain at least one interval
    #[error("Session '{0}' has no intervals")]
    EmptySession(String),

    /// Interval ids must be unique within a session
    #[error("Duplicate interval id '{interval_id}' in session '{session_id}'")]
    DuplicateIntervalId {
        session_id: String,
        interval_id: String,
    },

    /// The custom technique needs a session id to resolve
    #[error("Technique 'custom' requires a session id")]
    MissingSessionId,

    /// A standard plan was requested for the custom technique
    #[error("Technique 'custom' has no fixed durations")]
    NotStandard,

    /// Technique tag outside the closed set
    #[error("Unknown technique '{0}' (expected pomodoro, timeboxing, flowtime or custom)")]
    UnknownTechnique(String),

    /// Priority outside the closed set
    #[error("Unknown priority '{0}' (expected low, medium or high)")]
    UnknownPriority(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::Database(err.to_string())
                }
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
