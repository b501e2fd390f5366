//! Values the engine hands to its collaborators.

use serde::{Deserialize, Serialize};

use crate::geo::Region;
use crate::ids::MarkerId;
use crate::marker::Marker;

/// Marker ids currently in view, plus the region they were computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleSet {
    pub region: Region,
    pub marker_ids: Vec<MarkerId>,
}

impl VisibleSet {
    pub fn len(&self) -> usize {
        self.marker_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marker_ids.is_empty()
    }

    pub fn contains(&self, id: &MarkerId) -> bool {
        self.marker_ids.contains(id)
    }
}

/// One-time signal that the user came within range of a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityEvent {
    pub marker: Marker,
    pub distance_m: f64,
}

impl ProximityEvent {
    pub fn marker_id(&self) -> &MarkerId {
        &self.marker.id
    }
}

/// Engine output consumed by the map (visible set) and speech (proximity)
/// collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    VisibleSetChanged(VisibleSet),
    ProximityReached(ProximityEvent),
}

/// Diagnostic counters for UI display. Never affect behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub loaded: usize,
    pub resolved: usize,
    pub pending: usize,
    pub dropped: usize,
    pub visible: usize,
    pub announced: usize,
}
