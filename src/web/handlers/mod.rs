//! HTTP handlers.

pub mod file;
pub mod pages;

pub use file::*;
pub use pages::*;

use crate::file::FileStorage;
use crate::qr::QrGenerator;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upload storage.
    pub storage: FileStorage,
    /// QR code generator for download links.
    pub qr: QrGenerator,
    /// Public base URL for download links, without trailing slash.
    ///
    /// When `None`, the base URL is derived from each request.
    pub public_url: Option<String>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: FileStorage, max_upload_size: u64) -> Self {
        Self {
            storage,
            qr: QrGenerator::default(),
            public_url: None,
            max_upload_size,
        }
    }

    /// Use a fixed public base URL for download links.
    ///
    /// An empty string keeps request-derived URLs.
    pub fn with_public_url(mut self, public_url: &str) -> Self {
        let trimmed = public_url.trim_end_matches('/');
        self.public_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Use a custom QR code generator.
    pub fn with_qr_generator(mut self, qr: QrGenerator) -> Self {
        self.qr = qr;
        self
    }
}
