//! Error types for the observability pipeline

use thiserror::Error;

/// Result type alias for the observability pipeline
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for the observability pipeline
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Parsing errors
    #[error("Parsing error: {0}")]
    Parse(String),
}

impl MonitorError {
    /// Whether the error is recoverable by retrying on a later tick
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::Io(_) | MonitorError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::Config("bad threshold".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad threshold");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MonitorError = io.into();
        assert!(matches!(err, MonitorError::Io(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_config_not_retryable() {
        assert!(!MonitorError::Config("x".to_string()).is_retryable());
    }
}
