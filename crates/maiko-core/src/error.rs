use thiserror::Error;

use crate::traits::llm::LLMError;

#[derive(Debug, Error)]
pub enum MaikoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported attachment: {0}")]
    UnsupportedAttachment(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<LLMError> for MaikoError {
    fn from(err: LLMError) -> Self {
        MaikoError::LLM(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MaikoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_conversion() {
        let err: MaikoError = LLMError::Network("connection refused".into()).into();
        assert!(matches!(err, MaikoError::LLM(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: MaikoError = io.into();
        assert!(matches!(err, MaikoError::Io(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = MaikoError::NotFound("conversation 2024-01-01_00-00-00".into());
        assert_eq!(err.to_string(), "conversation 2024-01-01_00-00-00 not found");
    }
}
