//! # Error Types
//!
//! Custom error types for Roast Logger using `thiserror`.

use thiserror::Error;

/// Main error type for Roast Logger
#[derive(Debug, Error)]
pub enum RoastLoggerError {
    /// Serial transport errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No probe bridge could be opened on any candidate path
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Reconnect policy ran out of attempts
    #[error("Gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session record (de)serialization errors
    #[error("Record format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Action not permitted in the current session state
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// Session already has an end time
    #[error("Session has ended; no further changes allowed")]
    SessionFrozen,

    /// Frame timestamp does not advance the log
    #[error("Frame at {0} is not after the latest logged frame")]
    OutOfOrderFrame(chrono::DateTime<chrono::Utc>),

    /// Charge requested before any frame was logged
    #[error("No telemetry logged yet")]
    NoTelemetry,

    /// Charge requested without a coffee name
    #[error("Coffee name must be set before charging")]
    MissingCoffeeName,

    /// Fresh start would discard an unsaved roast
    #[error("Starting a new session discards the current roast; confirmation required")]
    UnconfirmedDiscard,

    /// Unrecognised or malformed operator command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Reference roast cannot be pinned
    #[error("Reference roast #{0} has no start or end time")]
    ReferenceIncomplete(u32),
}

/// Result type alias for Roast Logger
pub type Result<T> = std::result::Result<T, RoastLoggerError>;
