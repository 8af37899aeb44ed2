use std::collections::HashMap;

use super::retailers::{bestbuy, gamestop, target, walmart, BestBuyAdapter};
use super::traits::RetailerAdapter;
use crate::config::{AppConfig, RetailersConfig, ScraperConfig};
use crate::utils::error::{AppError, Result};

pub type AdapterBox = Box<dyn RetailerAdapter>;
pub type AdapterFactory = Box<dyn Fn(&AdapterContext) -> Result<AdapterBox> + Send + Sync>;

/// Everything an adapter may need at construction time.
#[derive(Debug, Clone, Default)]
pub struct AdapterContext {
    pub zip: Option<String>,
    pub scraper: ScraperConfig,
    pub retailers: RetailersConfig,
}

impl AdapterContext {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            zip: config.location.zip().map(str::to_string),
            scraper: config.scraper.clone(),
            retailers: config.retailers.clone(),
        }
    }
}

/// Maps retailer tags to adapter factories. Each run builds fresh adapters so
/// browser sessions never outlive the run that opened them.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Best Buy, Target, Walmart and GameStop adapters.
    pub fn with_default_adapters() -> Self {
        let mut registry = Self::new();
        registry.register(bestbuy::NAME, |context| {
            Ok(Box::new(BestBuyAdapter::from_context(context)?) as AdapterBox)
        });
        registry.register(target::NAME, |context| Ok(Box::new(target::adapter(context)) as AdapterBox));
        registry.register(walmart::NAME, |context| Ok(Box::new(walmart::adapter(context)) as AdapterBox));
        registry.register(gamestop::NAME, |context| Ok(Box::new(gamestop::adapter(context)) as AdapterBox));
        registry
    }

    /// Register (or replace) the factory for a retailer tag
    pub fn register<F>(&mut self, retailer: &str, factory: F)
    where
        F: Fn(&AdapterContext) -> Result<AdapterBox> + Send + Sync + 'static,
    {
        self.factories.insert(retailer.to_string(), Box::new(factory));
    }

    pub fn has_retailer(&self, retailer: &str) -> bool {
        self.factories.contains_key(retailer)
    }

    /// Registered retailer tags, sorted
    pub fn list_retailers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a fresh adapter for `retailer`.
    pub fn create(&self, retailer: &str, context: &AdapterContext) -> Result<AdapterBox> {
        let factory = self.factories.get(retailer).ok_or_else(|| AppError::UnknownRetailer {
            retailer: retailer.to_string(),
        })?;
        factory(context)
    }
}
