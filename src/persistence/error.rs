//! Error types for persistence and project storage

use thiserror::Error;

/// Errors that can occur when reading or writing the persisted envelope
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Input is not JSON at all
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level shape check failed
    #[error("invalid project data: field '{field}' is missing or has the wrong type")]
    InvalidShape { field: &'static str },

    /// Shape check passed but nested data could not be decoded
    #[error("malformed project data: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Errors reported by a project store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt project record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("project not found: {user_id}/{project_id}")]
    NotFound { user_id: String, project_id: String },

    #[error("invalid key component '{value}': only letters, digits, '-' and '_' are allowed")]
    InvalidKey { value: String },

    #[error("project name is required")]
    EmptyName,

    #[error("maximum of {max} projects allowed")]
    LimitReached { max: usize },

    #[error("rejected project data: {0}")]
    InvalidData(#[from] PersistenceError),
}
