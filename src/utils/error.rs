//! Error types for embroidery operations
//!
//! Custom error types with automatic conversions from common error sources,
//! built on thiserror for ergonomic handling throughout the library.

use std::io;
use thiserror::Error;

/// Main error type for stitchwise operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing embroidery file
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unsupported file format or missing reader/writer direction
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid pattern data
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid color format
    #[error("Invalid color format: {0}")]
    InvalidColor(String),

    /// Encoding error - pattern violates the destination profile
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for stitchwise operations
pub type Result<T> = std::result::Result<T, Error>;
