use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::geo::{Geocoder, ZipGeocoder};
use crate::models::{CheckRecord, StockStatus, Store, WatchItem};
use crate::plugins::manager::{AdapterBox, AdapterContext, AdapterRegistry};
use crate::plugins::notifiers::build_alert_sink;
use crate::plugins::traits::AlertSink;
use crate::snapshot::SnapshotWriter;
use crate::state::StateStore;
use crate::utils::error::{AppError, Result};

/// Collaborators a checker drives. Swappable so runs can be exercised
/// without a browser or network.
pub struct CheckerServices {
    pub registry: AdapterRegistry,
    pub geocoder: Arc<dyn Geocoder>,
    pub state: Arc<StateStore>,
    pub alert_sink: Arc<dyn AlertSink>,
    pub snapshot: SnapshotWriter,
}

/// One retailer's slice of a run.
struct RetailerRun<'a> {
    retailer: &'a str,
    adapter: AdapterBox,
    items: Vec<&'a WatchItem>,
    open_error: Option<AppError>,
}

pub struct StockChecker {
    config: AppConfig,
    context: AdapterContext,
    registry: AdapterRegistry,
    geocoder: Arc<dyn Geocoder>,
    state: Arc<StateStore>,
    alert_sink: Arc<dyn AlertSink>,
    snapshot: SnapshotWriter,
}

impl StockChecker {
    pub fn new(config: AppConfig, context: AdapterContext, services: CheckerServices) -> Self {
        Self {
            config,
            context,
            registry: services.registry,
            geocoder: services.geocoder,
            state: services.state,
            alert_sink: services.alert_sink,
            snapshot: services.snapshot,
        }
    }

    /// Production wiring: SQLite state at `state_db`, ZIP geocoder, built-in
    /// adapters, Discord or dry-run alerts.
    pub async fn from_config(config: AppConfig, dry_run: bool) -> Result<Self> {
        let state = StateStore::open(&config.state_db).await?;
        let services = CheckerServices {
            registry: AdapterRegistry::with_default_adapters(),
            geocoder: Arc::new(ZipGeocoder::new(&config.geocoder)?),
            state: Arc::new(state),
            alert_sink: build_alert_sink(&config.alerts, dry_run)?,
            snapshot: SnapshotWriter::new(&config.status_json),
        };
        let context = AdapterContext::from_config(&config);

        tracing::info!(
            items = config.watchlist.len(),
            retailers = ?services.registry.list_retailers(),
            dry_run,
            "Stock checker ready"
        );
        Ok(Self::new(config, context, services))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn watchlist(&self) -> &[WatchItem] {
        &self.config.watchlist
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Check the whole watchlist once.
    pub async fn run_once(&self) -> Result<Vec<CheckRecord>> {
        self.run_for_items(&self.config.watchlist).await
    }

    /// Check `items` once and replace the snapshot with the result.
    #[tracing::instrument(name = "run", skip_all, fields(run_id = %Uuid::new_v4(), items = items.len()))]
    pub async fn run_for_items(&self, items: &[WatchItem]) -> Result<Vec<CheckRecord>> {
        let (lat, lon) = self.resolve_coordinates().await?;

        let mut runs = Vec::new();
        for (retailer, group) in group_by_retailer(items) {
            let adapter = self.registry.create(retailer, &self.context)?;
            runs.push(RetailerRun {
                retailer,
                adapter,
                items: group,
                open_error: None,
            });
        }

        for run in &mut runs {
            if let Err(e) = run.adapter.open().await {
                tracing::error!(retailer = run.retailer, error = %e, "Failed to open adapter");
                run.open_error = Some(e);
            }
        }

        let outcome = self.check_all(&runs, lat, lon).await;

        for run in &mut runs {
            if let Err(e) = run.adapter.close().await {
                tracing::warn!(retailer = run.retailer, error = %e, "Failed to close adapter");
            }
        }

        let records = outcome?;
        self.snapshot.write(&records).await?;

        tracing::info!(records = records.len(), "Run complete");
        Ok(records)
    }

    /// Explicit coordinates win; otherwise the ZIP is geocoded.
    pub async fn resolve_coordinates(&self) -> Result<(f64, f64)> {
        if let Some(coords) = self.config.location.coordinates() {
            return Ok(coords);
        }
        match self.config.location.zip() {
            Some(zip) => {
                let coords = self.geocoder.geocode_zip(zip).await?;
                Ok((coords.lat, coords.lon))
            }
            None => Err(AppError::LocationUnresolved),
        }
    }

    async fn check_all(&self, runs: &[RetailerRun<'_>], lat: f64, lon: f64) -> Result<Vec<CheckRecord>> {
        let mut records = Vec::new();

        for run in runs {
            if run.open_error.is_some() {
                records.extend(unavailable_records(run));
                continue;
            }

            let stores = match run.adapter.find_stores_near(lat, lon, self.config.radius_miles).await {
                Ok(stores) => stores,
                Err(e) => {
                    tracing::error!(retailer = run.retailer, error = %e, "Store lookup failed");
                    records.extend(unavailable_records(run));
                    continue;
                }
            };
            tracing::debug!(retailer = run.retailer, stores = stores.len(), "Stores resolved");

            for item in &run.items {
                for store in &stores {
                    records.push(self.check_one(run, item, store).await?);
                }
            }
        }

        Ok(records)
    }

    async fn check_one(&self, run: &RetailerRun<'_>, item: &WatchItem, store: &Store) -> Result<CheckRecord> {
        let status = match run.adapter.check_item_in_store(item, store).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    retailer = %item.retailer,
                    item = %item.label,
                    store = %store.store_id,
                    error = %e,
                    "Check failed"
                );
                StockStatus::Unknown
            }
        };

        let transition = self
            .state
            .update(&item.retailer, &item.item_key(), &store.store_id, status)
            .await?;

        tracing::info!(
            retailer = %item.retailer,
            item = %item.label,
            store = %store.store_id,
            status = %status,
            changed = transition.changed,
            "Checked"
        );
        metrics::counter!("restock_checks_total", "retailer" => item.retailer.clone(), "status" => status.as_str())
            .increment(1);

        if transition.should_alert {
            let message = alert_message(item, store);
            match self.alert_sink.send(&message).await {
                Ok(()) => {
                    metrics::counter!("restock_alerts_total", "retailer" => item.retailer.clone()).increment(1);
                }
                Err(e) => {
                    tracing::error!(retailer = %item.retailer, item = %item.label, error = %e, "Alert delivery failed");
                }
            }
        }

        Ok(CheckRecord::new(item, store, status))
    }
}

pub fn alert_message(item: &WatchItem, store: &Store) -> String {
    format!(
        "Stock alert: {} is IN STOCK at {} ({}, store={})",
        item.label, store.name, item.retailer, store.store_id
    )
}

/// Items partitioned by retailer, groups in first-appearance order and items
/// in watchlist order within each group.
fn group_by_retailer(items: &[WatchItem]) -> Vec<(&str, Vec<&WatchItem>)> {
    let mut groups: Vec<(&str, Vec<&WatchItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(retailer, _)| *retailer == item.retailer) {
            Some((_, group)) => group.push(item),
            None => groups.push((item.retailer.as_str(), vec![item])),
        }
    }
    groups
}

fn unavailable_records(run: &RetailerRun<'_>) -> Vec<CheckRecord> {
    let store = Store::unavailable(run.retailer);
    run.items
        .iter()
        .map(|item| CheckRecord::new(item, &store, StockStatus::Unknown))
        .collect()
}
