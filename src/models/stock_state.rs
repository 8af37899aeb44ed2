use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::StockStatus;

/// One persisted observation, keyed by `(retailer, item_key, store_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct StockStateRow {
    pub retailer: String,
    pub item_key: String,
    pub store_id: String,
    pub status: StockStatus,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of recording a new observation against the previous one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionResult {
    pub changed: bool,
    pub should_alert: bool,
    pub previous_status: Option<StockStatus>,
    pub current_status: StockStatus,
}

impl TransitionResult {
    /// A missing previous row counts as a change; only arrivals into
    /// `InStock` alert.
    pub fn between(previous_status: Option<StockStatus>, current_status: StockStatus) -> Self {
        let changed = previous_status != Some(current_status);
        Self {
            changed,
            should_alert: changed && current_status == StockStatus::InStock,
            previous_status,
            current_status,
        }
    }
}
