//! Error handling for the Qwen3-TTS nodes
//!
//! Every failure is terminal for the request that raised it. Nothing is
//! retried automatically; the only recovery is scoped cleanup of temporary
//! reference files.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for model acquisition, audio interchange and dispatch
#[derive(Error, Debug)]
pub enum TtsError {
    // Acquisition Errors
    #[error("Failed to fetch {repo_id}: {reason}")]
    Fetch {
        repo_id: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to load model from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    // Audio Interchange Errors
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio encoding error: {reason}")]
    Encoding { reason: String },

    // Model Errors
    #[error("Model inference failed: {reason}")]
    ModelInference { reason: String },

    // Node Errors
    #[error("Invalid input '{slot}': {reason}")]
    InvalidInput { slot: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TtsError {
    pub(crate) fn fetch(repo_id: &str, reason: impl Into<String>) -> Self {
        TtsError::Fetch {
            repo_id: repo_id.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn fetch_with<E>(repo_id: &str, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TtsError::Fetch {
            repo_id: repo_id.to_string(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TtsError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(reason: impl Into<String>) -> Self {
        TtsError::Encoding {
            reason: reason.into(),
        }
    }

    pub(crate) fn inference(reason: impl Into<String>) -> Self {
        TtsError::ModelInference {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(slot: &str, reason: impl Into<String>) -> Self {
        TtsError::InvalidInput {
            slot: slot.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            TtsError::Fetch { .. } => "FETCH_ERROR",
            TtsError::Load { .. } => "LOAD_ERROR",
            TtsError::Write { .. } => "WRITE_ERROR",
            TtsError::Encoding { .. } => "ENCODING_ERROR",
            TtsError::ModelInference { .. } => "MODEL_INFERENCE_ERROR",
            TtsError::InvalidInput { .. } => "INVALID_INPUT",
            TtsError::Io(_) => "IO_ERROR",
            TtsError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller can fix the request and submit it again.
    ///
    /// Fetch failures count as recoverable because the cache slot stays empty
    /// and the next request fetches again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TtsError::Fetch { .. } | TtsError::Encoding { .. } | TtsError::InvalidInput { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TtsError::Fetch { .. } => vec![
                "Check network connectivity to the model hub",
                "Set HF_TOKEN if the repository requires authentication",
                "Make sure the models directory has enough free space",
            ],
            TtsError::Load { .. } => vec![
                "Delete the local model directory and let it download again",
                "Check that the inference bridge is running and matches the model version",
            ],
            TtsError::Write { .. } => vec![
                "Check free space in the scratch directory",
                "Set QWEN3_TTS_SCRATCH_DIR to a writable location",
            ],
            TtsError::Encoding { .. } => vec![
                "Reference audio must be a single clip shaped [1, channels, samples]",
            ],
            TtsError::InvalidInput { .. } => vec!["Pick a value from the node's choice list"],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = TtsError::fetch("Qwen/Qwen3-TTS-12Hz-1.7B-Base", "connection refused");
        assert_eq!(err.error_code(), "FETCH_ERROR");
        assert!(err.to_string().contains("Qwen/Qwen3-TTS-12Hz-1.7B-Base"));

        let err = TtsError::inference("out of memory");
        assert_eq!(err.error_code(), "MODEL_INFERENCE_ERROR");
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = TtsError::load("/models/tts/x", "config.json missing");
        assert!(!err.recovery_suggestions().is_empty());
        assert!(!err.is_recoverable());

        let err = TtsError::invalid_input("language", "unknown choice 'Klingon'");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fetch_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = TtsError::fetch_with("Qwen/x", "write failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
