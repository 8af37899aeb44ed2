use async_trait::async_trait;

use crate::models::{IdentifierKind, StockStatus, Store, WatchItem};
use crate::plugins::retailers::classify::StockSignals;
use crate::plugins::traits::{require_identifier, RetailerAdapter};
use crate::scraper::{append_query_params, PageSource};
use crate::utils::error::Result;

/// Retailer checked by rendering the product page in the session's local
/// context and reading its availability text.
///
/// There is no store directory behind these retailers, so every check runs
/// against one synthetic local-context store.
pub struct PageScrapeAdapter {
    retailer: &'static str,
    signals: StockSignals,
    zip_params: &'static [&'static str],
    zip: Option<String>,
    source: Box<dyn PageSource>,
}

impl PageScrapeAdapter {
    pub fn new(
        retailer: &'static str,
        signals: StockSignals,
        zip_params: &'static [&'static str],
        zip: Option<String>,
        source: Box<dyn PageSource>,
    ) -> Self {
        Self {
            retailer,
            signals,
            zip_params,
            zip,
            source,
        }
    }

    /// Product URL carrying the ZIP as a locale hint, when both are available.
    pub fn product_url(&self, url: &str) -> Result<String> {
        match self.zip.as_deref() {
            Some(zip) if !self.zip_params.is_empty() => {
                let params: Vec<(&str, &str)> = self.zip_params.iter().map(|key| (*key, zip)).collect();
                append_query_params(url, &params)
            }
            _ => Ok(url.to_string()),
        }
    }
}

#[async_trait]
impl RetailerAdapter for PageScrapeAdapter {
    fn name(&self) -> &str {
        self.retailer
    }

    async fn open(&mut self) -> Result<()> {
        self.source.open().await
    }

    async fn close(&mut self) -> Result<()> {
        self.source.close().await
    }

    async fn find_stores_near(&self, lat: f64, lon: f64, radius_miles: f64) -> Result<Vec<Store>> {
        Ok(vec![Store::local_context(self.retailer, lat, lon, radius_miles, self.zip.as_deref())])
    }

    async fn check_item_in_store(&self, item: &WatchItem, _store: &Store) -> Result<StockStatus> {
        let url = require_identifier(self.retailer, item, IdentifierKind::Url)?;
        let url = self.product_url(url)?;

        let content = self.source.page_text(&url).await?;
        let status = self.signals.classify(&content);
        if status == StockStatus::Unknown {
            tracing::warn!(retailer = self.retailer, item = %item.label, "Status unknown");
        }
        Ok(status)
    }
}
