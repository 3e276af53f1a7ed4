use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Invalid filter criteria for {field}: {reason}")]
    InvalidCriteria { field: &'static str, reason: String },

    #[error("Invalid date range '{input}': {reason}")]
    InvalidDateRange { input: String, reason: String },

    #[error("Invalid search query: {reason}")]
    InvalidQuery { reason: String },

    #[error("Data source '{source_name}' failed: {reason}")]
    SourceFailed { source_name: String, reason: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
