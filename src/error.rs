use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChurnError>;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Required tool `{tool}` is not available")]
    MissingTool { tool: String },
    #[error("Command `{command}` failed: {detail}")]
    Command { command: String, detail: String },
    #[error("Failed to acquire {repo}: {reason}")]
    Acquire { repo: String, reason: String },
    #[error("Classifier error: {0}")]
    Classifier(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl ChurnError {
    /// Errors that make the whole run pointless, as opposed to a single repository failing.
    pub fn is_environment(&self) -> bool {
        matches!(self, ChurnError::MissingTool { .. } | ChurnError::Config(_))
    }
}
