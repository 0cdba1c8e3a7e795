// src/error.rs

//! Unified error handling for the catalog core.
//!
//! Only genuine faults live here. Negative answers that the presentation
//! layer is expected to render (unknown lecture, already enrolled, full
//! lecture) are ordinary return values, and a missing backing file is
//! treated as an empty dataset rather than an error.

use std::fmt;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single line of a backing file could not be turned into a record
    #[error("Malformed {format} record: {reason}")]
    MalformedRecord { format: &'static str, reason: String },

    /// A lecture identifier matched neither the `L001` nor the numeric form
    #[error("Invalid lecture id '{0}'")]
    InvalidLectureId(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a malformed-record error for the given format.
    pub fn malformed(format: &'static str, reason: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            format,
            reason: reason.to_string(),
        }
    }

    /// Whether this error only concerns one line and the load may continue.
    pub fn is_line_local(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. } | Self::InvalidLectureId(_))
    }
}
