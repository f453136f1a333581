//! Error types for the core
use thiserror::Error;

/// Core errors
///
/// None of these are fatal to the process; callers log and degrade.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No output endpoint is open
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Start requested for an id that is not registered
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// A routine source entry could not be loaded
    #[error("Malformed routine '{source_name}': {reason}")]
    MalformedRoutine {
        /// File or source label
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A routine reported an error and was stopped
    #[error("Animation {id} error: {reason}")]
    RoutineFailure {
        /// Task label or animation id
        id: String,
        /// Message from the routine
        reason: String,
    },

    /// Persisted settings could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
