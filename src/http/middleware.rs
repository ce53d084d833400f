//! Request middleware: correlation ids, request logging, and admission control.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::USER_AGENT, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::ErrorResponse;
use crate::ratelimit::RateLimiter;

/// Header carrying the request correlation id, in and out.
pub static CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Rate limit key used when the peer address is unavailable.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Correlation id of the current request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// Attach a correlation id and log the start and end of every request.
///
/// An incoming `X-Correlation-ID` is reused; otherwise a UUID is generated.
/// The id is echoed on the response either way.
pub async fn request_context(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let correlation_id = request
        .headers()
        .get(&CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote_addr = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        remote_addr = %remote_addr,
        user_agent = %user_agent,
        "HTTP request started"
    );

    request
        .extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER.clone(), value);
    }

    let duration = start.elapsed();
    info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "HTTP request completed"
    );

    response
}

/// Reject the request with 429 when its client is out of tokens.
///
/// Clients are keyed by peer IP, without the port.
pub async fn admit(
    State(limiter): State<Arc<RateLimiter>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(connect_info.as_ref());

    if !limiter.allow(&key) {
        debug!(client = %key, path = %request.uri().path(), "Request rejected by rate limiter");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("Too many requests")),
        )
            .into_response();
    }

    next.run(request).await
}

fn client_key(connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key_strips_port() {
        let addr: SocketAddr = "192.168.1.7:54321".parse().unwrap();
        assert_eq!(client_key(Some(&ConnectInfo(addr))), "192.168.1.7");

        let v6: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(client_key(Some(&ConnectInfo(v6))), "::1");
    }

    #[test]
    fn test_client_key_without_peer() {
        assert_eq!(client_key(None), UNKNOWN_CLIENT);
    }
}
