use serde::{Deserialize, Serialize};

use crate::models::{StockStatus, Store, WatchItem};

/// Result of checking one item at one store during a run. The run's records
/// form the status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRecord {
    pub retailer: String,
    pub label: String,
    pub item_key: String,
    pub store_id: String,
    pub store_name: String,
    pub status: StockStatus,
}

impl CheckRecord {
    pub fn new(item: &WatchItem, store: &Store, status: StockStatus) -> Self {
        Self {
            retailer: item.retailer.clone(),
            label: item.label.clone(),
            item_key: item.item_key(),
            store_id: store.store_id.clone(),
            store_name: store.name.clone(),
            status,
        }
    }
}
