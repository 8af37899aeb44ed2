use async_trait::async_trait;

use crate::models::{IdentifierKind, StockStatus, Store, WatchItem};
use crate::utils::error::{AppError, Result};

/// Trait for implementing one retailer's store lookup and availability check.
///
/// Adapters holding a stateful session acquire it in `open` and release it in
/// `close`. `close` must be safe to call when `open` never ran or failed, and
/// safe to call twice.
#[async_trait]
pub trait RetailerAdapter: Send + Sync {
    /// Retailer tag this adapter serves, as used in the watchlist.
    fn name(&self) -> &str;

    async fn open(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Candidate stores within `radius_miles` of the coordinates.
    async fn find_stores_near(&self, lat: f64, lon: f64, radius_miles: f64) -> Result<Vec<Store>>;

    async fn check_item_in_store(&self, item: &WatchItem, store: &Store) -> Result<StockStatus>;
}

/// Identifier value of `item`, or `IdentifierMismatch` when its kind is not
/// the one this retailer understands.
pub fn require_identifier<'a>(retailer: &str, item: &'a WatchItem, expected: IdentifierKind) -> Result<&'a str> {
    if item.identifier.kind != expected {
        return Err(AppError::IdentifierMismatch {
            retailer: retailer.to_string(),
            expected,
            found: item.identifier.kind,
        });
    }
    Ok(&item.identifier.value)
}
