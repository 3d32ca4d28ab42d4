//! Error types for docqa.
//!
//! This module defines a unified error enum covering every failure kind in
//! the pipeline: configuration, I/O, extraction, chunking, embedding,
//! index lookup, and answer synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for docqa.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every document and every page failed extraction, or yielded only whitespace
    #[error("no text could be extracted from the provided documents")]
    NoExtractableContent,

    /// The text splitter produced zero chunks
    #[error("no chunks could be created from the extracted text")]
    NoChunksProduced,

    /// The indexer was invoked with an empty chunk sequence
    #[error("no text chunks provided for index creation")]
    NoChunksProvided,

    /// Embedding service unreachable, timed out, or returned malformed output
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Query-time embedding dimensions disagree with the persisted index.
    /// Embeddings from different models are not comparable, so we fail fast
    /// instead of returning garbage similarity scores.
    #[error("embedding dimension mismatch: index has {expected}, query produced {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Query attempted before any successful index build
    #[error("no index found at {0:?}; run 'docqa index' first")]
    IndexNotFound(PathBuf),

    /// Language model call failed or returned no usable output
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = AppError::NoExtractableContent;
        assert!(err.to_string().contains("no text could be extracted"));

        let err = AppError::IndexNotFound(PathBuf::from("/tmp/.docqa/index.sqlite"));
        assert!(err.to_string().contains("docqa index"));

        let err = AppError::EmbeddingDimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("384"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
