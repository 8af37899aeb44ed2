//! Fakes shared by unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::checker::{CheckerServices, StockChecker};
use crate::config::{
    AlertsConfig, AppConfig, GeocoderConfig, LocationConfig, RetailersConfig, ScraperConfig, ServerConfig,
};
use crate::geo::{Coordinates, Geocoder};
use crate::models::{IdentifierKind, StockStatus, Store, WatchItem};
use crate::plugins::manager::{AdapterBox, AdapterContext, AdapterRegistry};
use crate::plugins::traits::{require_identifier, AlertSink, RetailerAdapter};
use crate::snapshot::SnapshotWriter;
use crate::state::StateStore;
use crate::utils::error::{AppError, Result};

pub(crate) fn store(retailer: &str, store_id: &str) -> Store {
    Store {
        retailer: retailer.to_string(),
        store_id: store_id.to_string(),
        name: format!("{} #{}", retailer, store_id),
        lat: 41.88,
        lon: -87.63,
        address: String::new(),
    }
}

pub(crate) fn test_config(dir: &TempDir, watchlist: Vec<WatchItem>) -> AppConfig {
    AppConfig {
        location: LocationConfig {
            zip: None,
            lat: Some(41.88),
            lon: Some(-87.63),
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

/// Scripted retailer. Clones share canned statuses and the event log, so a
/// test can change answers between runs and inspect adapter lifecycle calls.
#[derive(Clone)]
pub(crate) struct FakeRetailer {
    name: String,
    stores: Vec<Store>,
    statuses: Arc<Mutex<HashMap<(String, String), StockStatus>>>,
    events: Arc<Mutex<Vec<String>>>,
    fail_open: bool,
    fail_stores: bool,
    sku_only: bool,
}

impl FakeRetailer {
    pub(crate) fn new(name: &str, stores: Vec<Store>) -> Self {
        Self {
            name: name.to_string(),
            stores,
            statuses: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
            fail_stores: false,
            sku_only: false,
        }
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn failing_stores(mut self) -> Self {
        self.fail_stores = true;
        self
    }

    pub(crate) fn requiring_sku(mut self) -> Self {
        self.sku_only = true;
        self
    }

    pub(crate) fn set_status(&self, item: &WatchItem, store_id: &str, status: StockStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert((item.item_key(), store_id.to_string()), status);
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl RetailerAdapter for FakeRetailer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&mut self) -> Result<()> {
        self.log(format!("open:{}", self.name));
        if self.fail_open {
            return Err(AppError::Browser("launch failed".to_string()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log(format!("close:{}", self.name));
        Ok(())
    }

    async fn find_stores_near(&self, _lat: f64, _lon: f64, _radius_miles: f64) -> Result<Vec<Store>> {
        if self.fail_stores {
            return Err(AppError::Scraping("store locator down".to_string()));
        }
        Ok(self.stores.clone())
    }

    async fn check_item_in_store(&self, item: &WatchItem, store: &Store) -> Result<StockStatus> {
        self.log(format!("check:{}:{}", item.label, store.store_id));
        if self.sku_only {
            require_identifier(&self.name, item, IdentifierKind::Sku)?;
        }
        self.statuses
            .lock()
            .unwrap()
            .get(&(item.item_key(), store.store_id.clone()))
            .copied()
            .ok_or_else(|| AppError::Scraping("no canned status".to_string()))
    }
}

pub(crate) struct FixedGeocoder;

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode_zip(&self, _zip: &str) -> Result<Coordinates> {
        Ok(Coordinates {
            lat: 41.8858,
            lon: -87.6181,
        })
    }
}

/// Alert sink that keeps every message.
#[derive(Default)]
pub(crate) struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub(crate) async fn build_checker(
    config: AppConfig,
    retailers: Vec<FakeRetailer>,
    alert_sink: Arc<dyn AlertSink>,
) -> StockChecker {
    let mut registry = AdapterRegistry::new();
    for retailer in retailers {
        let name = retailer.name.clone();
        registry.register(&name, move |_| Ok(Box::new(retailer.clone()) as AdapterBox));
    }

    let services = CheckerServices {
        registry,
        geocoder: Arc::new(FixedGeocoder),
        state: Arc::new(StateStore::open(&config.state_db).await.unwrap()),
        alert_sink,
        snapshot: SnapshotWriter::new(&config.status_json),
    };
    let context = AdapterContext::from_config(&config);
    StockChecker::new(config, context, services)
}
