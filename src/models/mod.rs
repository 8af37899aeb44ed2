use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod check_record;
pub mod stock_state;
pub mod store;
pub mod watch_item;

// Re-exports for convenience
pub use check_record::*;
pub use stock_state::*;
pub use store::*;
pub use watch_item::*;

/// Availability of one item at one store.
///
/// Only equality matters for transition detection; `Unknown` is what a
/// failed or inconclusive check degrades to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(StockStatus::InStock),
            "out_of_stock" => Ok(StockStatus::OutOfStock),
            "unknown" => Ok(StockStatus::Unknown),
            other => Err(format!("invalid stock status: {}", other)),
        }
    }
}
