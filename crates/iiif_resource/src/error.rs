use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fragment: {value}")]
    InvalidFragment { value: String },
}

impl ResourceError {
    /// Create an invalid fragment error.
    pub fn invalid_fragment(value: impl Into<String>) -> Self {
        Self::InvalidFragment {
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
