//! HTTP adapter exposing the ad store behind per-client admission control.

mod dto;
mod handlers;
mod middleware;
mod server;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;

pub use dto::{CreateAdRequest, ErrorResponse, ListAdsQuery};
pub use handlers::AppState;
pub use middleware::{CorrelationId, CORRELATION_ID_HEADER, UNKNOWN_CLIENT};
pub use server::HttpServer;

use crate::ratelimit::RateLimiter;

/// Build the application router.
///
/// Layers run outermost first: request timeout, correlation id and request
/// logging, then rate limiting. Throttled requests never reach the store.
pub fn router(state: AppState, limiter: Arc<RateLimiter>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/adposts", post(handlers::create_ad))
        .route("/adposts/:id", get(handlers::get_ad))
        .route("/adposts/:id/deactivate", post(handlers::deactivate_ad))
        .route("/adspots", get(handlers::list_ad_spots))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(from_fn_with_state(limiter, middleware::admit))
        .layer(from_fn(middleware::request_context))
        .layer(TimeoutLayer::new(request_timeout))
}
