//! Error taxonomy for the font subsystem
//!
//! None of these are fatal: the public entry points log them and hand
//! back a zeroed result so text renders blank instead of aborting.

use thiserror::Error;

/// Failure of a font, glyph or asset operation
#[derive(Debug, Error)]
pub enum FontError {
    /// Code point has no glyph, or a requested file does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Registry or page is full
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Glyph is not an outline (embedded bitmaps are rejected)
    #[error("unsupported glyph format: {0}")]
    UnsupportedFormat(String),

    /// Persisted blob exists but has the wrong size or layout
    #[error("corrupt font data: {0}")]
    Corrupt(String),

    /// Face open/read/write failure
    #[error("I/O failure: {0}")]
    Io(String),

    /// Rasterizer missing or failed to initialize
    #[error("initialization failure: {0}")]
    Init(String),
}

impl From<std::io::Error> for FontError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(e.to_string()),
            _ => Self::Io(e.to_string()),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FontError>;
