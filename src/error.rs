//! Error types for table rendering

use thiserror::Error;

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the canvas and its resource loaders.
///
/// Layout itself never fails; these surface from font/image loading (which the
/// generator logs and skips) and from writing the finished document.
#[derive(Error, Debug)]
pub enum Error {
    /// Font file missing or unparsable
    #[error("Font error: {0}")]
    Font(String),

    /// Image file missing, unreadable or in an unsupported format
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid table configuration
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Canvas used out of order (e.g. drawing before a page exists)
    #[error("Canvas error: {0}")]
    Canvas(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
