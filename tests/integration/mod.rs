// Shared fixtures for integration tests

pub mod persistence_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use restock_watcher::config::{
    AlertsConfig, AppConfig, GeocoderConfig, LocationConfig, RetailersConfig, ScraperConfig, ServerConfig,
};
use restock_watcher::geo::{Coordinates, Geocoder};
use restock_watcher::models::{IdentifierKind, StockStatus, Store, WatchItem};
use restock_watcher::plugins::manager::{AdapterBox, AdapterContext, AdapterRegistry};
use restock_watcher::plugins::{AlertSink, RetailerAdapter};
use restock_watcher::{AppError, CheckerServices, SnapshotWriter, StateStore, StockChecker};

pub fn url_item(retailer: &str, label: &str) -> WatchItem {
    let slug = label.to_lowercase().replace(' ', "-");
    WatchItem::new(retailer, label, IdentifierKind::Url, format!("https://{}.test/p/{}", retailer, slug))
}

/// Retailer whose answers are set by the test. Unscripted checks fail.
#[derive(Clone)]
pub struct ScriptedRetailer {
    name: String,
    stores: Vec<Store>,
    answers: Arc<Mutex<HashMap<(String, String), StockStatus>>>,
}

impl ScriptedRetailer {
    pub fn new(name: &str, store_ids: &[&str]) -> Self {
        let stores = store_ids
            .iter()
            .map(|id| Store {
                retailer: name.to_string(),
                store_id: id.to_string(),
                name: format!("Store {}", id),
                lat: 41.88,
                lon: -87.63,
                address: String::new(),
            })
            .collect();

        Self {
            name: name.to_string(),
            stores,
            answers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn set(&self, item: &WatchItem, store_id: &str, status: StockStatus) {
        self.answers
            .lock()
            .unwrap()
            .insert((item.item_key(), store_id.to_string()), status);
    }
}

#[async_trait]
impl RetailerAdapter for ScriptedRetailer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_stores_near(&self, _lat: f64, _lon: f64, _radius: f64) -> restock_watcher::Result<Vec<Store>> {
        Ok(self.stores.clone())
    }

    async fn check_item_in_store(&self, item: &WatchItem, store: &Store) -> restock_watcher::Result<StockStatus> {
        self.answers
            .lock()
            .unwrap()
            .get(&(item.item_key(), store.store_id.clone()))
            .copied()
            .ok_or_else(|| AppError::Scraping("page did not load".to_string()))
    }
}

pub struct ChicagoGeocoder;

#[async_trait]
impl Geocoder for ChicagoGeocoder {
    async fn geocode_zip(&self, _zip: &str) -> restock_watcher::Result<Coordinates> {
        Ok(Coordinates { lat: 41.8858, lon: -87.6181 })
    }
}

#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for CollectingSink {
    async fn send(&self, message: &str) -> restock_watcher::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub fn test_config(dir: &TempDir, watchlist: Vec<WatchItem>) -> AppConfig {
    AppConfig {
        location: LocationConfig {
            zip: Some("60601".to_string()),
            lat: None,
            lon: None,
        },
        radius_miles: 20.0,
        poll_seconds: 180,
        state_db: dir.path().join("state.sqlite3").to_string_lossy().into_owned(),
        status_json: dir.path().join("status.json").to_string_lossy().into_owned(),
        alerts: AlertsConfig::default(),
        scraper: ScraperConfig::default(),
        retailers: RetailersConfig::default(),
        geocoder: GeocoderConfig::default(),
        server: ServerConfig::default(),
        watchlist,
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub checker: StockChecker,
    pub sink: Arc<CollectingSink>,
}

impl TestEnv {
    pub async fn new(retailers: Vec<ScriptedRetailer>) -> anyhow::Result<Self> {
        Self::with_items(retailers, vec![]).await
    }

    pub async fn with_items(retailers: Vec<ScriptedRetailer>, items: Vec<WatchItem>) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = test_config(&dir, items);
        let sink = Arc::new(CollectingSink::default());
        let checker = build_checker(config, retailers, sink.clone()).await?;
        Ok(Self { dir, checker, sink })
    }

    pub fn snapshot(&self) -> SnapshotWriter {
        SnapshotWriter::new(&self.checker.config().status_json)
    }
}

pub async fn build_checker(
    config: AppConfig,
    retailers: Vec<ScriptedRetailer>,
    sink: Arc<dyn AlertSink>,
) -> anyhow::Result<StockChecker> {
    let mut registry = AdapterRegistry::new();
    for retailer in retailers {
        let name = retailer.name.clone();
        registry.register(&name, move |_| Ok(Box::new(retailer.clone()) as AdapterBox));
    }

    let services = CheckerServices {
        registry,
        geocoder: Arc::new(ChicagoGeocoder),
        state: Arc::new(StateStore::open(&config.state_db).await?),
        alert_sink: sink,
        snapshot: SnapshotWriter::new(&config.status_json),
    };
    let context = AdapterContext::from_config(&config);
    Ok(StockChecker::new(config, context, services))
}
