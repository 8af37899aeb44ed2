use serde::{Deserialize, Serialize};

/// Store id used for retailers that only expose a session-local view of
/// availability instead of a store directory.
pub const LOCAL_CONTEXT_STORE_ID: &str = "local-context";

/// Store id recorded when a retailer's stores could not be listed at all.
pub const UNAVAILABLE_STORE_ID: &str = "unavailable";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub retailer: String,
    pub store_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
}

impl Store {
    /// Synthetic store standing for "whatever the browser session resolves
    /// to near these coordinates".
    pub fn local_context(retailer: &str, lat: f64, lon: f64, radius_miles: f64, zip: Option<&str>) -> Self {
        let address = match zip {
            Some(zip) => format!("within {:.1} miles of {}", radius_miles, zip),
            None => format!("within {:.1} miles", radius_miles),
        };
        Self {
            retailer: retailer.to_string(),
            store_id: LOCAL_CONTEXT_STORE_ID.to_string(),
            name: format!("{} local area", retailer),
            lat,
            lon,
            address,
        }
    }

    pub(crate) fn unavailable(retailer: &str) -> Self {
        Self {
            retailer: retailer.to_string(),
            store_id: UNAVAILABLE_STORE_ID.to_string(),
            name: format!("{} (stores unavailable)", retailer),
            lat: 0.0,
            lon: 0.0,
            address: String::new(),
        }
    }
}
