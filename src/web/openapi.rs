//! OpenAPI document for the HTTP API.

use axum::Json;
use utoipa::OpenApi;

use crate::web::dto::{UploadForm, UploadResponse};
use crate::web::error::{ErrorBody, ErrorCode};
use crate::web::handlers;

/// OpenAPI description of the upload and download routes.
#[derive(OpenApi)]
#[openapi(
    info(title = "qrshare", description = "Share files with a download link and QR code"),
    paths(handlers::file::upload_file, handlers::file::download_file),
    components(schemas(UploadResponse, UploadForm, ErrorBody, ErrorCode)),
    tags((name = "files", description = "File upload and download"))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json - Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
