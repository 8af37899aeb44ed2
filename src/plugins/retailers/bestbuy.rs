use async_trait::async_trait;
use config::ConfigError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::time::Duration;

use crate::geo::haversine_miles;
use crate::models::{IdentifierKind, StockStatus, Store, WatchItem};
use crate::plugins::manager::AdapterContext;
use crate::plugins::retailers::classify::StockSignals;
use crate::plugins::traits::{require_identifier, RetailerAdapter};
use crate::utils::error::Result;

pub const NAME: &str = "bestbuy";

pub const SIGNALS: StockSignals = StockSignals {
    negative: &["sold out", "unavailable", "out of stock", "not available"],
    positive: &["available", "in stock", "pickup", "ready"],
};

const STORE_FIELDS: &str = "storeId,name,lat,lng,address,city,region,postalCode";
const AVAILABILITY_FIELDS: &str = "sku,name,inStoreAvailability,onlineAvailability,storePickup,storePickupSla";

#[derive(Debug, Deserialize)]
struct StoresResponse {
    #[serde(default)]
    stores: Vec<StoreEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreEntry {
    store_id: Option<Value>,
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    city: Option<String>,
    region: Option<String>,
    postal_code: Option<String>,
}

impl StoreEntry {
    /// The store, plus whether the API actually gave its coordinates.
    fn into_store(self) -> Option<(Store, bool)> {
        let store_id = match self.store_id? {
            Value::String(id) => id,
            Value::Null => return None,
            other => other.to_string(),
        };
        if store_id.is_empty() {
            return None;
        }

        let located = self.lat.is_some() && self.lng.is_some();
        let address = [self.address, self.city, self.region, self.postal_code]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let store = Store {
            retailer: NAME.to_string(),
            name: self.name.unwrap_or_else(|| format!("Best Buy {}", store_id)),
            store_id,
            lat: self.lat.unwrap_or(0.0),
            lon: self.lng.unwrap_or(0.0),
            address,
        };
        Some((store, located))
    }
}

/// Best Buy through its public products/stores API.
#[derive(Debug)]
pub struct BestBuyAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BestBuyAdapter {
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Message("BESTBUY_API_KEY is required for Best Buy adapter".into()))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_context(context: &AdapterContext) -> Result<Self> {
        Self::new(
            context.retailers.bestbuy_api_key.clone(),
            &context.retailers.bestbuy_base_url,
            context.scraper.request_timeout(),
        )
    }

    async fn get_json(&self, endpoint: &str, show: &str, page_size: u32) -> Result<Value> {
        let page_size = page_size.to_string();
        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("format", "json"),
                ("show", show),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RetailerAdapter for BestBuyAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn find_stores_near(&self, lat: f64, lon: f64, radius_miles: f64) -> Result<Vec<Store>> {
        let endpoint = format!("{}/stores(area({},{},{}))", self.base_url, lat, lon, radius_miles);
        let payload = self.get_json(&endpoint, STORE_FIELDS, 100).await?;
        let response: StoresResponse = serde_json::from_value(payload)?;

        // Stores without coordinates cannot be measured; keep them, last.
        let mut stores: Vec<(Option<f64>, Store)> = response
            .stores
            .into_iter()
            .filter_map(StoreEntry::into_store)
            .map(|(store, located)| {
                let distance = located.then(|| haversine_miles(lat, lon, store.lat, store.lon));
                (distance, store)
            })
            .filter(|(distance, _)| distance.is_none_or(|d| d <= radius_miles))
            .collect();
        stores.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        let stores: Vec<Store> = stores.into_iter().map(|(_, store)| store).collect();

        tracing::debug!(count = stores.len(), radius_miles, "Best Buy stores found");
        Ok(stores)
    }

    async fn check_item_in_store(&self, item: &WatchItem, store: &Store) -> Result<StockStatus> {
        let sku = require_identifier(NAME, item, IdentifierKind::Sku)?;
        let endpoint = format!("{}/products(sku={})+stores(storeId={})", self.base_url, sku, store.store_id);
        let payload = self.get_json(&endpoint, AVAILABILITY_FIELDS, 1).await?;

        Ok(SIGNALS.classify(&flatten_text(&payload)))
    }
}

/// Scalar values of a JSON document joined by spaces, keys dropped.
pub fn flatten_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten_text).collect::<Vec<_>>().join(" "),
        Value::Object(map) => map.values().map(flatten_text).collect::<Vec<_>>().join(" "),
    }
}
