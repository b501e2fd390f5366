//! At-most-once proximity announcements.

use std::collections::HashSet;
use std::sync::Arc;

use hm_core::geo::haversine_distance_m;
use hm_core::{Coordinate, Marker, MarkerId, ProximityEvent};

/// Turns position updates into proximity events.
///
/// Owns the Proximity Record: the ids already announced. The record only
/// grows, so a marker is announced at most once per session even if the user
/// leaves its radius and comes back.
#[derive(Debug)]
pub struct ProximityDetector {
    radius_m: f64,
    announced: HashSet<MarkerId>,
}

impl ProximityDetector {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            announced: HashSet::new(),
        }
    }

    /// Evaluate `position` against `visible` in order; one event per newly
    /// reached marker, in evaluation order.
    pub fn evaluate(&mut self, position: &Coordinate, visible: &[Arc<Marker>]) -> Vec<ProximityEvent> {
        if !position.is_usable() {
            return Vec::new();
        }

        let mut events = Vec::new();
        for marker in visible {
            let Some(coordinate) = marker.coordinate() else {
                continue;
            };
            if self.announced.contains(&marker.id) {
                continue;
            }
            let distance_m = haversine_distance_m(position, &coordinate);
            if distance_m <= self.radius_m {
                self.announced.insert(marker.id.clone());
                events.push(ProximityEvent {
                    marker: Marker::clone(marker),
                    distance_m,
                });
            }
        }
        events
    }

    pub fn has_announced(&self, id: &MarkerId) -> bool {
        self.announced.contains(id)
    }

    pub fn announced_count(&self) -> usize {
        self.announced.len()
    }
}
