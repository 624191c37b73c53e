//! Web server bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, WebConfig};
use crate::file::FileStorage;
use crate::{QrShareError, Result};

use super::handlers::AppState;
use super::middleware::UploadRateLimiter;
use super::router::create_router;

/// HTTP server for uploads and downloads.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Web configuration.
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Creates the upload directory if it does not exist.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                QrShareError::Config(format!(
                    "invalid web server address {}:{}: {e}",
                    config.web.host, config.web.port
                ))
            })?;

        let storage = FileStorage::new(&config.files.storage_path)?;
        tracing::info!("File storage initialized at: {}", config.files.storage_path);

        let app_state = AppState::new(storage, config.files.max_upload_size_bytes())
            .with_public_url(&config.web.public_url);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            web_config: config.web.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router; starts the rate limiter cleanup task when enabled.
    fn build_router(&self) -> Router {
        let rate_limiter = (self.web_config.upload_rate_limit > 0).then(|| {
            let limiter = Arc::new(UploadRateLimiter::new(self.web_config.upload_rate_limit));
            limiter.clone().start_cleanup_task();
            limiter
        });

        create_router(self.app_state.clone(), &self.web_config, rate_limiter)
            .layer(CompressionLayer::new())
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down web server");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config(storage: &TempDir) -> Config {
        let mut config = Config::default();
        config.web.host = "127.0.0.1".to_string();
        config.web.port = 0;
        config.files.storage_path = storage.path().join("uploads").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::new(&config).unwrap();

        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert!(dir.path().join("uploads").is_dir());
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.web.host = "not an address".to_string();

        let result = WebServer::new(&config);
        assert!(matches!(result, Err(QrShareError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::new(&config).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("OK"));
    }
}
