//! Error types for the document classifier.

use std::path::PathBuf;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while loading or invoking the statistical model.
///
/// None of these ever reach a caller of `Classifier::classify_document`;
/// load errors mean "no model", invocation errors mean "fall back to rules".
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {reason}")]
    InvalidArtifact { reason: String },

    #[error("Model produced unknown label: {label}")]
    UnknownLabel { label: String },

    #[error("Numerical failure during prediction: {reason}")]
    Numerical { reason: String },

    #[error("Predictor panicked: {reason}")]
    Panicked { reason: String },
}

/// Text extraction (OCR) errors.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
