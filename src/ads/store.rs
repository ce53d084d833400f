//! In-memory ad store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use super::model::{Ad, AdStatus, NewAd, Placement};
use super::AdRepository;
use crate::clock::{Clock, SystemClock};

/// Errors raised by the ad store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No ad was ever created with this id.
    #[error("ad not found: {id}")]
    NotFound { id: String },
}

/// Thread-safe in-memory collection of ads.
///
/// Writes take the exclusive lock over the whole map and reads take the
/// shared lock, so each call is atomic on its own. Nothing is atomic across
/// calls. TTL expiry is never written back: it only affects
/// [`AdStore::list_eligible`].
pub struct AdStore {
    /// Ads indexed by id
    ads: RwLock<HashMap<String, Ad>>,
    clock: Arc<dyn Clock>,
}

impl AdStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            ads: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Store a new active ad under a freshly generated id.
    pub fn create(&self, new: NewAd) -> Ad {
        let now = self.clock.now();
        let ad = Ad::from_new(Uuid::new_v4().to_string(), new, now);

        self.ads.write().insert(ad.id.clone(), ad.clone());

        debug!(
            id = %ad.id,
            placement = %ad.placement,
            ttl_minutes = ad.ttl_minutes,
            "Created ad"
        );
        ad
    }

    /// Fetch an ad exactly as stored. No expiry check happens here.
    pub fn get(&self, id: &str) -> Result<Ad, StoreError> {
        self.ads
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Mark an ad inactive and stamp `deactivate_at` with the current time.
    ///
    /// Deactivating an already inactive ad succeeds and re-stamps it.
    pub fn deactivate(&self, id: &str) -> Result<Ad, StoreError> {
        let now = self.clock.now();
        let mut ads = self.ads.write();

        let ad = ads
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        ad.status = AdStatus::Inactive;
        ad.deactivate_at = Some(now);

        debug!(id = %id, "Deactivated ad");
        Ok(ad.clone())
    }

    /// All active, unexpired ads for `placement`, in no particular order.
    pub fn list_eligible(&self, placement: Placement) -> Vec<Ad> {
        let now = self.clock.now();
        let ads = self.ads.read();

        let eligible: Vec<Ad> = ads
            .values()
            .filter(|ad| ad.is_eligible_at(now, placement))
            .cloned()
            .collect();

        trace!(
            placement = %placement,
            scanned = ads.len(),
            eligible = eligible.len(),
            "Listed eligible ads"
        );
        eligible
    }

    /// Number of ads ever created.
    pub fn len(&self) -> usize {
        self.ads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AdStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdRepository for AdStore {
    async fn create_ad(&self, new: NewAd) -> crate::error::Result<Ad> {
        Ok(self.create(new))
    }

    async fn get_ad(&self, id: &str) -> crate::error::Result<Ad> {
        Ok(self.get(id)?)
    }

    async fn deactivate_ad(&self, id: &str) -> crate::error::Result<Ad> {
        Ok(self.deactivate(id)?)
    }

    async fn list_eligible_ads(&self, placement: Placement) -> crate::error::Result<Vec<Ad>> {
        Ok(self.list_eligible(placement))
    }
}
