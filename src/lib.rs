pub mod checker;
pub mod config;
pub mod geo;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod scraper;
pub mod snapshot;
pub mod state;
pub mod utils;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use checker::{CheckerServices, StockChecker};
pub use config::AppConfig;
pub use scheduler::{ItemRunner, ItemScheduler, JobInfo, SchedulerStats};
pub use snapshot::SnapshotWriter;
pub use state::StateStore;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
