use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GeocoderConfig;
use crate::utils::error::{AppError, Result};

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points, in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Turns a postal code into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode_zip(&self, zip: &str) -> Result<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct ZipResponse {
    #[serde(default)]
    places: Vec<ZipPlace>,
}

#[derive(Debug, Deserialize)]
struct ZipPlace {
    latitude: String,
    longitude: String,
}

/// US ZIP lookup against the zippopotam.us API.
pub struct ZipGeocoder {
    client: Client,
    base_url: String,
}

impl ZipGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for ZipGeocoder {
    async fn geocode_zip(&self, zip: &str) -> Result<Coordinates> {
        let url = format!("{}/{}", self.base_url, zip);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Geocode(format!("zip lookup unreachable: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(AppError::Geocode(format!(
                "zip lookup failed: {}",
                response.status().as_u16()
            )));
        }

        let payload: ZipResponse = response
            .json()
            .await
            .map_err(|e| AppError::Geocode(format!("invalid geocoder response: {}", e)))?;

        let place = payload
            .places
            .first()
            .ok_or_else(|| AppError::Geocode(format!("no places found for zip {}", zip)))?;

        let lat = place.latitude.trim().parse::<f64>();
        let lon = place.longitude.trim().parse::<f64>();
        match (lat, lon) {
            (Ok(lat), Ok(lon)) => {
                tracing::debug!(zip, lat, lon, "Geocoded zip");
                Ok(Coordinates { lat, lon })
            }
            _ => Err(AppError::Geocode("invalid geocoder response".to_string())),
        }
    }
}
