//! qrshare - share files over HTTP with a download link and a QR code.
//!
//! An upload is stored under a random UUID-based name; the response carries
//! an absolute download URL and a PNG QR code of that URL as a data URI.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod qr;
pub mod web;

pub use config::Config;
pub use error::{QrShareError, Result};
pub use file::{secure_filename, FileStorage, StoredFile};
pub use qr::{QrGenerator, QrOptions};
pub use web::WebServer;
