use crate::plugins::manager::AdapterContext;
use crate::plugins::retailers::classify::StockSignals;
use crate::plugins::retailers::page::PageScrapeAdapter;
use crate::scraper::{BrowserSession, PageSource};

pub const NAME: &str = "gamestop";

pub const SIGNALS: StockSignals = StockSignals {
    negative: &["out of stock", "not available", "unavailable"],
    positive: &["pick up", "available", "in stock"],
};

// GameStop ignores locale query parameters; the session's geolocation decides.
pub fn adapter(context: &AdapterContext) -> PageScrapeAdapter {
    with_source(context.zip.clone(), Box::new(BrowserSession::new(context.scraper.clone())))
}

pub fn with_source(zip: Option<String>, source: Box<dyn PageSource>) -> PageScrapeAdapter {
    PageScrapeAdapter::new(NAME, SIGNALS, &[], zip, source)
}
