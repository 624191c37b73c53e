//! Error types for qrshare.

use thiserror::Error;

/// Common error type for qrshare.
#[derive(Error, Debug)]
pub enum QrShareError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The data could not be encoded as a QR code (e.g. too long).
    #[error("QR code error: {0}")]
    QrCode(#[from] qrcode::types::QrError),

    /// PNG encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for qrshare operations.
pub type Result<T> = std::result::Result<T, QrShareError>;
