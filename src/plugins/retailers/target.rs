use crate::plugins::manager::AdapterContext;
use crate::plugins::retailers::classify::StockSignals;
use crate::plugins::retailers::page::PageScrapeAdapter;
use crate::scraper::{BrowserSession, PageSource};

pub const NAME: &str = "target";

pub const SIGNALS: StockSignals = StockSignals {
    negative: &["out of stock", "sold out", "not available at this store", "unavailable"],
    positive: &["pickup", "ready for pickup", "in stock", "available"],
};

/// Target reads the store context from these query parameters.
const ZIP_PARAMS: &[&str] = &["zip", "zipcode"];

pub fn adapter(context: &AdapterContext) -> PageScrapeAdapter {
    with_source(context.zip.clone(), Box::new(BrowserSession::new(context.scraper.clone())))
}

pub fn with_source(zip: Option<String>, source: Box<dyn PageSource>) -> PageScrapeAdapter {
    PageScrapeAdapter::new(NAME, SIGNALS, ZIP_PARAMS, zip, source)
}
