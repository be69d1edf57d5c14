//! Error types for InternPath Assist.

use uuid::Uuid;

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Settings store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures reported by external collaborators (send, generation, navigation).
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Failed to send message to {destination}: {reason}")]
    SendFailed { destination: String, reason: String },

    #[error("Failed to generate {what}: {reason}")]
    GenerationFailed { what: String, reason: String },

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the guided setup state machine.
///
/// Guard violations (bad phone, wrong code) are not errors: they set the
/// state's `error` field and leave the step unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Cannot {action} while in step {from}")]
    InvalidTransition { from: String, action: String },

    #[error("{action} is already in progress")]
    Busy { action: String },
}

/// Dialogue session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session is closed")]
    Closed,

    #[error("Message {message_id} has no action at index {index}")]
    ActionNotFound { message_id: u64, index: usize },

    #[error("Session {id} reply worker stopped")]
    WorkerStopped { id: Uuid },
}

/// Speech capability errors.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech capability is not available")]
    Unavailable,

    #[error("Speech recognition failed: {0}")]
    Recognition(String),
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;
