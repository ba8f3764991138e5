use thiserror::Error;

/// Main error type for cvbench
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load benchmark data: {0}")]
    FetchFailed(String),

    #[error("Failed to submit benchmark: {0}")]
    SubmitFailed(String),

    #[error("Invalid benchmark record: {0}")]
    InvalidRecord(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ViewerError {
    /// Whether the error should block the whole view rather than show as a notice
    pub fn is_blocking(&self) -> bool {
        !matches!(
            self,
            ViewerError::SubmitFailed(_) | ViewerError::InvalidRecord(_)
        )
    }
}

impl From<toml::de::Error> for ViewerError {
    fn from(error: toml::de::Error) -> Self {
        ViewerError::Config(error.to_string())
    }
}

impl From<toml::ser::Error> for ViewerError {
    fn from(error: toml::ser::Error) -> Self {
        ViewerError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
