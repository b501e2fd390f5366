//! Geocoder backed by a Nominatim-compatible `/search` endpoint.

use anyhow::Context;
use hm_core::ports::{GeocodeError, GeocoderPort};
use hm_core::Coordinate;
use serde::Deserialize;

use crate::config::GeocoderConfig;

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

pub struct HttpGeocoder {
    client: reqwest::Client,
    search_url: String,
    country_codes: Option<String>,
}

impl HttpGeocoder {
    pub fn new(config: &GeocoderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            country_codes: config.country_codes.clone(),
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> GeocodeError {
    if error.is_timeout() {
        GeocodeError::Timeout
    } else if error.is_decode() {
        GeocodeError::InvalidResponse(error.to_string())
    } else {
        GeocodeError::Network(error.to_string())
    }
}

fn parse_hit(hit: &SearchHit) -> Result<Coordinate, GeocodeError> {
    let latitude: f64 = hit
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude: {}", hit.lat)))?;
    let longitude: f64 = hit
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude: {}", hit.lon)))?;

    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_usable() {
        return Err(GeocodeError::InvalidResponse(format!(
            "coordinate out of range: {coordinate}"
        )));
    }
    Ok(coordinate)
}

#[async_trait::async_trait]
impl GeocoderPort for HttpGeocoder {
    async fn resolve_address(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let mut query = vec![("q", address), ("format", "json"), ("limit", "1")];
        if let Some(codes) = self.country_codes.as_deref() {
            query.push(("countrycodes", codes));
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Network(format!("unexpected status: {status}")));
        }

        let hits: Vec<SearchHit> = response.json().await.map_err(map_reqwest_error)?;
        let hit = hits
            .first()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;
        parse_hit(hit)
    }
}
