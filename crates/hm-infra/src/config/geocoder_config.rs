use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the HTTP geocoding adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service; `/search` is appended.
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Optional ISO 3166 filter, e.g. `"us"`.
    pub country_codes: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("historical-marker/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 10_000,
            country_codes: Some("us".to_string()),
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
