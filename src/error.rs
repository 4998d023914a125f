//! Error types for the DataHub client.

use thiserror::Error;

/// Main error type for dataset operations.
#[derive(Error, Debug)]
pub enum DataHubError {
    /// Missing credentials, bucket, or other settings; raised before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local folder or remote dataset content does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input contained no usable units of work
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Metadata API answered with a non-success status
    #[error("API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Raw object-store failure
    #[error("Object storage error: {0}")]
    Storage(String),

    /// Plain HTTP transfer failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataHubError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        DataHubError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn storage(message: impl std::fmt::Display) -> Self {
        DataHubError::Storage(message.to_string())
    }

    /// True for a missing local/remote resource, including API 404s.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataHubError::NotFound(_) | DataHubError::Api { status: 404, .. }
        )
    }

    /// Process exit code for a fatal error of this class
    pub fn exit_code(&self) -> u8 {
        match self {
            DataHubError::Configuration(_) => 2,
            DataHubError::NotFound(_) => 3,
            DataHubError::Validation(_) => 4,
            DataHubError::Api { .. } => 5,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

impl From<reqwest::Error> for DataHubError {
    fn from(e: reqwest::Error) -> Self {
        DataHubError::Http(e.to_string())
    }
}

impl From<http_dl::DownloadError> for DataHubError {
    fn from(e: http_dl::DownloadError) -> Self {
        match e {
            http_dl::DownloadError::Io(io) => DataHubError::Io(io),
            other => DataHubError::Http(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for DataHubError {
    fn from(e: walkdir::Error) -> Self {
        match e.into_io_error() {
            Some(io) => DataHubError::Io(io),
            None => DataHubError::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DataHubError>;
