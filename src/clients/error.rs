use thiserror::Error;

/// Errors from external collaborators
#[derive(Debug, Error)]
pub enum ClientError {
    /// A command ran but exited unsuccessfully
    #[error("command failed: {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Requested object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
