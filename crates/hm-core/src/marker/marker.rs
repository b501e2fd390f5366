use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::ids::MarkerId;

/// Where a marker is, or how to find out.
///
/// A marker without a usable coordinate and without an address is never
/// represented: such records are dropped at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum MarkerLocation {
    Resolved { coordinate: Coordinate },
    /// Waiting for the geocoder. `address` is never empty.
    Pending { address: String },
}

/// A point of interest.
///
/// Display fields are an opaque payload for the map and speech collaborators;
/// the engine only reads `id` and `location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub body: String,
    pub image: Option<String>,
    pub location: MarkerLocation,
}

impl Marker {
    pub fn resolved(id: impl Into<MarkerId>, title: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            body: String::new(),
            image: None,
            location: MarkerLocation::Resolved { coordinate },
        }
    }

    pub fn pending(id: impl Into<MarkerId>, title: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            body: String::new(),
            image: None,
            location: MarkerLocation::Pending {
                address: address.into(),
            },
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match &self.location {
            MarkerLocation::Resolved { coordinate } => Some(*coordinate),
            MarkerLocation::Pending { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.location, MarkerLocation::Resolved { .. })
    }

    pub fn pending_address(&self) -> Option<&str> {
        match &self.location {
            MarkerLocation::Pending { address } => Some(address.as_str()),
            MarkerLocation::Resolved { .. } => None,
        }
    }

    /// Copy of this marker with its location resolved to `coordinate`.
    pub fn with_coordinate(&self, coordinate: Coordinate) -> Self {
        Self {
            location: MarkerLocation::Resolved { coordinate },
            ..self.clone()
        }
    }
}
