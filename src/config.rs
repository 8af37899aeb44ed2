use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;
use validator::Validate;

use crate::models::WatchItem;
use crate::utils::error::Result;

/// Lowest accepted poll interval. Anything faster is abusive towards the
/// retailers being checked.
pub const MIN_POLL_SECONDS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub location: LocationConfig,
    #[serde(default = "default_radius_miles")]
    #[validate(range(exclusive_min = 0.0))]
    pub radius_miles: f64,
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    #[serde(default = "default_state_db")]
    pub state_db: String,
    #[serde(default = "default_status_json")]
    pub status_json: String,
    #[serde(default)]
    #[validate(nested)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub retailers: RetailersConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub watchlist: Vec<WatchItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LocationConfig {
    #[validate(length(min = 3))]
    pub zip: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,
}

impl LocationConfig {
    /// Explicit coordinates, when both halves are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref().map(str::trim).filter(|z| !z.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AlertsConfig {
    #[validate(url)]
    pub discord_webhook: Option<String>,
    pub discord_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub chrome_path: Option<String>,
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: default_navigation_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            chrome_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailersConfig {
    pub bestbuy_api_key: Option<String>,
    #[serde(default = "default_bestbuy_base_url")]
    pub bestbuy_base_url: String,
}

impl Default for RetailersConfig {
    fn default() -> Self {
        Self {
            bestbuy_api_key: None,
            bestbuy_base_url: default_bestbuy_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_base_url(),
            timeout: default_geocoder_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_radius_miles() -> f64 {
    20.0
}

fn default_poll_seconds() -> u64 {
    180
}

fn default_state_db() -> String {
    "state.sqlite3".to_string()
}

fn default_status_json() -> String {
    "status.json".to_string()
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    12
}

fn default_user_agent() -> String {
    format!("RestockWatcher/{}", env!("CARGO_PKG_VERSION"))
}

fn default_bestbuy_base_url() -> String {
    "https://api.bestbuy.com/v1".to_string()
}

fn default_geocoder_base_url() -> String {
    "https://api.zippopotam.us/us".to_string()
}

fn default_geocoder_timeout() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl AppConfig {
    /// Load from a YAML/TOML file, overlaid with `RESTOCK__*` environment
    /// variables.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.retailers.bestbuy_api_key.is_none() {
            config.retailers.bestbuy_api_key = env::var("BESTBUY_API_KEY").ok();
        }
        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate_all()?;
        Ok(config)
    }

    /// Field rules plus the cross-field checks the derive cannot express.
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self)?;
        self.validate_rules()?;
        Ok(())
    }

    fn validate_rules(&self) -> std::result::Result<(), ConfigError> {
        if self.poll_seconds < MIN_POLL_SECONDS {
            return Err(ConfigError::Message(format!(
                "poll_seconds must be at least {}",
                MIN_POLL_SECONDS
            )));
        }

        if self.location.coordinates().is_none() && self.location.zip().is_none() {
            return Err(ConfigError::Message(
                "location must include zip or lat/lon".into(),
            ));
        }

        if self.location.lat.is_some() != self.location.lon.is_some() && self.location.zip().is_none() {
            return Err(ConfigError::Message(
                "location lat and lon must be given together".into(),
            ));
        }

        if self.watchlist.is_empty() {
            return Err(ConfigError::Message("watchlist must not be empty".into()));
        }

        if Url::parse(&self.retailers.bestbuy_base_url).is_err() {
            return Err(ConfigError::Message("Invalid Best Buy base URL format".into()));
        }

        if Url::parse(&self.geocoder.base_url).is_err() {
            return Err(ConfigError::Message("Invalid geocoder base URL format".into()));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }
}
