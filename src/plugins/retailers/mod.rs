// Retailer adapter implementations
pub mod bestbuy;
pub mod classify;
pub mod gamestop;
pub mod page;
pub mod target;
pub mod walmart;

pub use bestbuy::BestBuyAdapter;
pub use classify::StockSignals;
pub use page::PageScrapeAdapter;
