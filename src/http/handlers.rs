//! HTTP handlers for ad endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, instrument, warn};

use super::dto::{CreateAdRequest, ErrorResponse, ListAdsQuery};
use crate::ads::AdRepository;
use crate::error::AdServerError;

/// Shared state for the ad handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backing ad repository
    pub ads: Arc<dyn AdRepository>,
    /// TTL used when a create request omits one
    pub default_ttl_minutes: u32,
}

impl AppState {
    pub fn new(ads: Arc<dyn AdRepository>, default_ttl_minutes: u32) -> Self {
        Self {
            ads,
            default_ttl_minutes,
        }
    }
}

impl IntoResponse for AdServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            AdServerError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// POST /adposts - Create an ad
#[instrument(skip(state, payload))]
pub async fn create_ad(
    State(state): State<AppState>,
    payload: Result<Json<CreateAdRequest>, JsonRejection>,
) -> Result<Response, AdServerError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected malformed create request");
        AdServerError::Validation(rejection.body_text())
    })?;

    let new_ad = req.into_new_ad(state.default_ttl_minutes)?;
    let created = state.ads.create_ad(new_ad).await?;

    info!(id = %created.id, placement = %created.placement, "Ad created");
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// GET /adposts/:id - Fetch an ad
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AdServerError> {
    let ad = state.ads.get_ad(&id).await?;
    Ok(Json(ad).into_response())
}

/// POST /adposts/:id/deactivate - Deactivate an ad
#[instrument(skip(state))]
pub async fn deactivate_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AdServerError> {
    let ad = state.ads.deactivate_ad(&id).await?;
    info!(id = %ad.id, "Ad deactivated");
    Ok(Json(ad).into_response())
}

/// GET /adspots?placement=..&status=active - List eligible ads for a placement
pub async fn list_ad_spots(
    State(state): State<AppState>,
    Query(query): Query<ListAdsQuery>,
) -> Result<Response, AdServerError> {
    let placement = query.placement()?;
    let ads = state.ads.list_eligible_ads(placement).await?;
    Ok(Json(ads).into_response())
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("not found"))).into_response()
}
