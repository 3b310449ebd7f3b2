//! ReelCues Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::captions::ParseError;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),

    #[error("Caption parse error: {0}")]
    CaptionParse(#[from] ParseError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
