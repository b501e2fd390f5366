//! Ingestion record format.
//!
//! Mirrors the JSON produced by the state marker conversion script:
//! one object per marker with optional coordinates and a structured address.
//! Every field except `id` is optional; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use super::{Marker, MarkerLocation};
use crate::geo::Coordinate;
use crate::ids::MarkerId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub coordinates: Option<RecordCoordinates>,
    #[serde(default)]
    pub address: RecordAddress,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordCoordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordAddress {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub state: String,
}

impl RecordAddress {
    /// Free-text address for the geocoder, e.g. `"Austin, Travis, TX"`.
    ///
    /// Returns `None` when neither city nor county is known; a bare state is
    /// too coarse to place a marker.
    pub fn geocoding_query(&self) -> Option<String> {
        let city = self.city.trim();
        let county = self.county.trim();
        if city.is_empty() && county.is_empty() {
            return None;
        }
        let parts: Vec<&str> = [city, county, self.state.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        Some(parts.join(", "))
    }
}

impl RecordCoordinates {
    fn usable(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.latitude?, self.longitude?);
        coordinate.is_usable().then_some(coordinate)
    }
}

impl MarkerRecord {
    /// Converts the record into a marker.
    ///
    /// - usable coordinates → resolved marker
    /// - otherwise a usable address → pending marker
    /// - neither → `None` (unresolvable, dropped by the caller)
    ///
    /// A blank id gets a generated one so the marker still has a stable identity
    /// for the rest of the session.
    pub fn into_marker(self) -> Option<Marker> {
        let location = match self.coordinates.as_ref().and_then(RecordCoordinates::usable) {
            Some(coordinate) => MarkerLocation::Resolved { coordinate },
            None => MarkerLocation::Pending {
                address: self.address.geocoding_query()?,
            },
        };

        let id = match self.id.trim() {
            "" => MarkerId::new(),
            id => MarkerId::from(id),
        };

        Some(Marker {
            id,
            title: self.title,
            subtitle: self.kind.filter(|kind| !kind.trim().is_empty()),
            body: self.description,
            image: self.images.into_iter().find(|image| !image.trim().is_empty()),
            location,
        })
    }
}
