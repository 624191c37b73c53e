//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

/// Successful upload response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Absolute URL that downloads the stored file.
    pub download_url: String,
    /// QR code of `download_url` as a `data:image/png;base64,...` URI.
    pub qr_code: String,
    /// Sanitized original filename.
    pub filename: String,
    /// Random token the stored filename is derived from.
    pub file_id: String,
}

/// Multipart form accepted by `POST /upload` (documentation only).
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// File to share.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
