/// Centralized error types for the search service
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Store Errors
    #[error("Store error: {0}")]
    StoreError(String),

    // Data Errors
    #[error("Deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Malformed master row: {0}")]
    MalformedMasterRow(String),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    // Generic Errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            SearchError::ConfigError(_) => "CFG_001",
            SearchError::StoreError(_) => "STORE_001",
            SearchError::DeserializationError(_) => "DATA_001",
            SearchError::MalformedMasterRow(_) => "DATA_002",
            SearchError::FileError(_) => "FILE_001",
            SearchError::InternalError(_) => "INT_001",
        }
    }
}
