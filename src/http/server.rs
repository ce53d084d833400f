//! HTTP server implementation.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{AdServerError, Result};

/// HTTP server for the ad service.
pub struct HttpServer {
    /// Bound listener
    listener: TcpListener,
    /// Fully layered application router
    router: Router,
}

impl HttpServer {
    /// Bind the listen address.
    pub async fn bind(addr: SocketAddr, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(addr = %addr, error = %e, "Failed to bind HTTP listener");
            AdServerError::Io(e)
        })?;
        Ok(Self { listener, router })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the provided signal resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            AdServerError::Io(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::AdStore;
    use crate::config::RateLimitSettings;
    use crate::http::{router, AppState};
    use crate::ratelimit::RateLimiter;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_limits_by_peer() {
        let settings = RateLimitSettings {
            refill_rate: 0.001,
            burst: 2,
            idle_eviction_secs: None,
        };
        let limiter = Arc::new(RateLimiter::new(&settings).unwrap());
        let state = AppState::new(Arc::new(AdStore::new()), 0);
        let app = router(state, Arc::clone(&limiter), Duration::from_secs(5));

        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), app)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        let first = raw_get(addr, "/adspots?placement=home_screen").await;
        assert!(first.starts_with("HTTP/1.1 200"), "{first}");
        assert!(first.to_ascii_lowercase().contains("x-correlation-id"));

        let second = raw_get(addr, "/adspots?placement=home_screen").await;
        assert!(second.starts_with("HTTP/1.1 200"), "{second}");

        let third = raw_get(addr, "/adspots?placement=home_screen").await;
        assert!(third.starts_with("HTTP/1.1 429"), "{third}");

        // Keyed by IP only, so every connection from loopback shares one bucket
        assert_eq!(limiter.bucket_count(), 1);
        assert!(limiter.tokens("127.0.0.1").is_some());

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
