//! Router configuration.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::WebConfig;

use super::error::ApiError;
use super::handlers::{download_file, health_check, index, upload_file, AppState};
use super::middleware::{create_cors_layer, security_headers, upload_rate_limit, UploadRateLimiter};
use super::openapi::openapi_json;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router.
///
/// `rate_limiter`, when given, guards `POST /upload`.
pub fn create_router(
    app_state: Arc<AppState>,
    config: &WebConfig,
    rate_limiter: Option<Arc<UploadRateLimiter>>,
) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let mut upload_routes = Router::new().route("/upload", post(upload_file));
    if let Some(limiter) = rate_limiter {
        upload_routes = upload_routes.route_layer(middleware::from_fn(move |req, next| {
            let limiter = limiter.clone();
            upload_rate_limit(limiter, req, next)
        }));
    }

    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/download/:filename", get(download_file))
        .merge(upload_routes);

    if config.serve_static {
        match create_static_router(&config.static_path) {
            Some(static_router) => router = router.merge(static_router),
            None => tracing::warn!(
                "Static directory {} not found, /static is disabled",
                config.static_path
            ),
        }
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a router serving files from `path` under `/static`.
///
/// Returns `None` if `path` is not a directory.
pub fn create_static_router<S>(path: &str) -> Option<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    if !Path::new(path).is_dir() {
        return None;
    }
    Some(Router::new().nest_service("/static", ServeDir::new(path)))
}

async fn not_found() -> impl IntoResponse {
    ApiError::not_found("Not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_static_router_missing_dir() {
        assert!(create_static_router::<()>("/nonexistent/static/dir").is_none());
    }

    #[test]
    fn test_create_static_router_existing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(create_static_router::<()>(dir.path().to_str().unwrap()).is_some());
    }
}
