//! Ad records and their in-memory store.

mod model;
mod store;

use async_trait::async_trait;

pub use model::{Ad, AdStatus, NewAd, Placement, UnknownPlacement};
pub use store::{AdStore, StoreError};

/// Storage seam used by the HTTP layer.
///
/// [`AdStore`] is the only production implementation; the trait lets
/// handlers run against other backends in tests.
#[async_trait]
pub trait AdRepository: Send + Sync {
    /// Create an ad and return the stored record.
    async fn create_ad(&self, new: NewAd) -> crate::error::Result<Ad>;

    /// Fetch an ad by id.
    async fn get_ad(&self, id: &str) -> crate::error::Result<Ad>;

    /// Deactivate an ad by id.
    async fn deactivate_ad(&self, id: &str) -> crate::error::Result<Ad>;

    /// List ads currently eligible for `placement`.
    async fn list_eligible_ads(&self, placement: Placement) -> crate::error::Result<Vec<Ad>>;
}
