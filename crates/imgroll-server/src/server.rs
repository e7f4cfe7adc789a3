use std::future::{Future, IntoFuture};
use std::sync::Arc;

use imgroll_catalog::{CancelToken, CatalogRepository, ImageRepository};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;

/// imgroll HTTP server.
pub struct ImageServer {
    config: ServerConfig,
    repo: Arc<dyn ImageRepository>,
    cancel: CancelToken,
}

impl ImageServer {
    /// Create a server whose catalog is a TTL-cached scan of
    /// `config.image_dir`.
    pub fn new(config: ServerConfig) -> Self {
        let repo = Arc::new(CatalogRepository::new(
            config.image_dir.clone(),
            config.rescan_interval,
        ));
        Self::with_repository(config, repo)
    }

    pub fn with_repository(config: ServerConfig, repo: Arc<dyn ImageRepository>) -> Self {
        Self {
            config,
            repo,
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            repo: Arc::clone(&self.repo),
            image_dir: self.config.image_dir.clone(),
            cancel: self.cancel.clone(),
        };
        build_router(state, self.config.request_timeout)
    }

    /// Bind `config.bind_addr` and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Once `shutdown` fires, any in-flight rescan is cancelled and open
    /// requests get `config.shutdown_grace` to complete before the server
    /// returns anyway.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            image_dir = %self.config.image_dir.display(),
            "imgroll server listening"
        );

        let app = self.router();
        let cancel = self.cancel.clone();
        let grace = self.config.shutdown_grace;
        let (draining_tx, draining_rx) = oneshot::channel::<()>();

        let signal = async move {
            shutdown.await;
            tracing::info!("shutdown requested, draining connections");
            cancel.cancel();
            let _ = draining_tx.send(());
        };
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();
        let deadline = async move {
            if draining_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => result?,
            _ = deadline => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "grace period elapsed, closing open connections"
                );
            }
        }
        tracing::info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn server_construction() {
        let server = ImageServer::new(ServerConfig::default());
        assert_eq!(
            server.config().bind_addr,
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn router_builds() {
        let server = ImageServer::new(ServerConfig::default());
        let _router = server.router();
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"jpg").unwrap();
        let config = ServerConfig {
            image_dir: dir.path().to_path_buf(),
            shutdown_grace: Duration::from_secs(1),
            ..ServerConfig::default()
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(ImageServer::new(config).serve_on(listener, async move {
            let _ = stop_rx.await;
        }));

        let health = raw_get(addr, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200"), "{health}");
        assert!(health.ends_with("OK"), "{health}");

        let list = raw_get(addr, "/list").await;
        assert!(list.contains(r#""total":1"#), "{list}");

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
