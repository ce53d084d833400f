//! Wire-level request and response shapes.

use serde::{Deserialize, Serialize};

use crate::ads::{NewAd, Placement};
use crate::error::{AdServerError, Result};

/// Body of `POST /adposts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub placement: String,
    /// Signed so that negative input can be reported instead of failing to parse.
    #[serde(default)]
    pub ttl_minutes: Option<i64>,
}

impl CreateAdRequest {
    /// Validate the request and turn it into store input.
    ///
    /// A missing `ttlMinutes` falls back to `default_ttl_minutes`.
    pub fn into_new_ad(self, default_ttl_minutes: u32) -> Result<NewAd> {
        if self.title.is_empty() {
            return Err(invalid("title is required"));
        }
        if self.image_url.is_empty() {
            return Err(invalid("image_url is required"));
        }

        let ttl_minutes = match self.ttl_minutes {
            None => default_ttl_minutes,
            Some(ttl) if ttl < 0 => {
                return Err(invalid("ttl_minutes must be greater than or equal to 0"))
            }
            Some(ttl) => u32::try_from(ttl).map_err(|_| invalid("ttl_minutes is too large"))?,
        };

        let placement = parse_placement(&self.placement)?;

        Ok(NewAd {
            title: self.title,
            image_url: self.image_url,
            placement,
            ttl_minutes,
        })
    }
}

/// Query string of `GET /adspots`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAdsQuery {
    pub placement: Option<String>,
    pub status: Option<String>,
}

impl ListAdsQuery {
    /// Resolve the requested placement. Only `status=active` (or no status)
    /// is accepted.
    pub fn placement(&self) -> Result<Placement> {
        match self.status.as_deref() {
            None | Some("") | Some("active") => {}
            Some(_) => return Err(invalid("status parameter must be 'active'")),
        }

        match self.placement.as_deref() {
            None | Some("") => Err(invalid("placement parameter is required")),
            Some(raw) => parse_placement(raw),
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

fn parse_placement(raw: &str) -> Result<Placement> {
    raw.parse::<Placement>().map_err(|e| invalid(e.to_string()))
}

fn invalid(message: impl Into<String>) -> AdServerError {
    AdServerError::Validation(message.into())
}
