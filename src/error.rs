//! Error types for packfs
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PackError
pub type Result<T> = std::result::Result<T, PackError>;

/// Unified error type for packfs operations
#[derive(Debug, Error)]
pub enum PackError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Navigation Errors
    // -------------------------------------------------------------------------
    #[error("entry is not a folder")]
    NotAFolder,

    #[error("entry is not a file")]
    NotAFile,

    #[error("file has not been committed to the archive yet")]
    NotCommitted,

    #[error("no entry named '{name}'")]
    NotFound { name: String },

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("invalid entry name '{0}': names must not contain NUL bytes")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("archive corrupted: {0}")]
    Corruption(String),
}
