//! Upload and download handlers.

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::Response,
    Json,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters, double quotes and backslashes never reach the quoted
/// `filename` parameter; non-ASCII names are additionally sent as an
/// RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("attachment; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

/// First value of a header, trimmed, ignoring empty values.
///
/// Comma-separated proxy headers yield their first element.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Derive `scheme://host` for links pointing back at this server.
///
/// Reverse proxy headers (`X-Forwarded-Proto`, `X-Forwarded-Host`) win over
/// the `Host` header, which wins over the request URI authority.
pub fn request_base_url(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = first_header_value(headers, "x-forwarded-proto")
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

/// Build the absolute download URL of a stored file.
pub fn download_url(base_url: &str, stored_name: &str) -> String {
    format!(
        "{}/download/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(stored_name)
    )
}

/// POST /upload - Store a file and return its download link and QR code.
///
/// Request body: multipart/form-data with a "file" field.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(content = crate::web::dto::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file provided", body = crate::web::error::ErrorBody),
        (status = 413, description = "File too large", body = crate::web::error::ErrorBody),
        (status = 429, description = "Upload rate limit exceeded", body = crate::web::error::ErrorBody)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value, not an upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content = field.bytes().await?;
        upload = Some((filename, content));
        break;
    }

    let (filename, content) = upload.ok_or_else(|| ApiError::bad_request("No file selected"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if content.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if content.len() as u64 > state.max_upload_size {
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            state.max_upload_size / 1024 / 1024
        )));
    }

    let stored = state.storage.save(&content, &filename).map_err(|e| {
        tracing::error!("Failed to save file: {}", e);
        ApiError::internal("Failed to save file")
    })?;

    let base_url = match &state.public_url {
        Some(url) => url.clone(),
        None => request_base_url(&headers, &uri),
    };
    let download_url = download_url(&base_url, &stored.stored_name);

    let qr_code = match state.qr.encode_data_uri(&download_url) {
        Ok(qr_code) => qr_code,
        Err(e) => {
            tracing::error!("Failed to generate QR code for {}: {}", download_url, e);
            if let Err(e) = std::fs::remove_file(&stored.path) {
                tracing::warn!("Failed to remove {}: {}", stored.path.display(), e);
            }
            return Err(ApiError::internal("Failed to generate QR code"));
        }
    };

    tracing::info!(
        file_id = %stored.file_id,
        stored_name = %stored.stored_name,
        size = stored.size,
        "File uploaded"
    );

    Ok(Json(UploadResponse {
        success: true,
        download_url,
        qr_code,
        filename: stored.original_name,
        file_id: stored.file_id,
    }))
}

/// GET /download/:filename - Download a stored file as an attachment.
///
/// The file is streamed from disk; `Range` and conditional requests are
/// honoured.
#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Stored filename returned by the upload")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = crate::web::error::ErrorBody)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = state.storage.locate(&filename)?;

    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::not_found("File not found"));
    }

    let disposition =
        HeaderValue::from_str(&content_disposition_header(&filename)).map_err(|e| {
            tracing::error!("Invalid Content-Disposition for {}: {}", filename, e);
            ApiError::internal("Failed to build response")
        })?;

    tracing::info!(stored_name = %filename, status = %response.status(), "File downloaded");

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}
