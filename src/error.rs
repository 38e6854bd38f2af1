//! Error types for join-board
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid config, unknown task)
//! - 3: Access denied (permission denied, session never established)
//! - 4: Operation failed (store unreachable, partial write)

use thiserror::Error;

/// Exit codes for the jb CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const ACCESS_DENIED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for join-board operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),

    // Access denied (exit code 3)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Session was closed before authentication completed")]
    AuthClosed,

    // Operation failures (exit code 4)
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("{operation} stopped at {step} after {completed} completed writes: {source}")]
    PartialWrite {
        operation: &'static str,
        step: String,
        completed: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::ContactNotFound(_)
            | Error::InvalidDueDate(_) => exit_codes::USER_ERROR,

            // Access denied
            Error::PermissionDenied(_) | Error::AuthClosed => exit_codes::ACCESS_DENIED,

            // A partial write reports the code of whatever stopped it
            Error::PartialWrite { source, .. } => source.exit_code(),

            // Operation failures
            Error::StoreUnavailable(_)
            | Error::NotFound(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for machine-readable error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::PartialWrite {
                operation,
                step,
                completed,
                source,
            } => Some(serde_json::json!({
                "operation": operation,
                "step": step,
                "completed": completed,
                "cause": source.to_string(),
            })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::ContactNotFound(id) => Some(serde_json::json!({ "contact_id": id })),
            Error::NotFound(path) => Some(serde_json::json!({ "path": path })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }

    /// True when the store reported that the addressed row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for join-board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
