//! Authoritative in-memory marker collection.
//! 标记的权威内存集合。
//!
//! The store is owned by the engine actor; every mutation goes through it.
//! Readers receive [`MarkerSnapshot`]s: `Arc`-shared vectors that are never
//! mutated after being handed out. Resolution uses copy-on-write, so a filter
//! scan running on another thread keeps reading the snapshot it started with.

use std::collections::HashMap;
use std::sync::Arc;

use hm_core::{Coordinate, Marker, MarkerId, MarkerRecord};

/// Immutable view of the resolved markers, in ingestion/resolution order.
pub type MarkerSnapshot = Arc<Vec<Arc<Marker>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub resolved: usize,
    pub pending: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadSummary),
    /// A previous `load` already populated the store; nothing changed.
    AlreadyLoaded,
}

/// Result of [`MarkerStore::apply_resolution`]. Only `Applied` changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Applied,
    AlreadyResolved,
    NotFound,
    /// The coordinate is not usable; the marker stays pending.
    Rejected,
}

/// A marker waiting for the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMarker {
    pub id: MarkerId,
    pub address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Records received by `load`, including dropped ones.
    pub loaded: usize,
    pub resolved: usize,
    pub pending: usize,
    pub dropped: usize,
}

#[derive(Debug, Default)]
pub struct MarkerStore {
    loaded: bool,
    markers: HashMap<MarkerId, Arc<Marker>>,
    resolved: MarkerSnapshot,
    pending: Vec<MarkerId>,
    dropped: usize,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Ingest the full record list. Only the first call has any effect.
    pub fn load(&mut self, records: Vec<MarkerRecord>) -> LoadOutcome {
        if self.loaded {
            return LoadOutcome::AlreadyLoaded;
        }
        self.loaded = true;

        let mut resolved = Vec::new();
        for record in records {
            let Some(marker) = record.into_marker() else {
                self.dropped += 1;
                continue;
            };
            // First record wins; identity must stay unique.
            if self.markers.contains_key(&marker.id) {
                self.dropped += 1;
                continue;
            }

            let marker = Arc::new(marker);
            if marker.is_resolved() {
                resolved.push(Arc::clone(&marker));
            } else {
                self.pending.push(marker.id.clone());
            }
            self.markers.insert(marker.id.clone(), marker);
        }
        self.resolved = Arc::new(resolved);

        LoadOutcome::Loaded(LoadSummary {
            resolved: self.resolved.len(),
            pending: self.pending.len(),
            dropped: self.dropped,
        })
    }

    /// Current resolved markers. Cheap: clones an `Arc`.
    pub fn resolved(&self) -> MarkerSnapshot {
        Arc::clone(&self.resolved)
    }

    /// Up to `limit` pending markers in ingestion order. They stay pending
    /// until a resolution is applied.
    pub fn pending_batch(&self, limit: usize) -> Vec<PendingMarker> {
        self.pending
            .iter()
            .filter_map(|id| {
                let marker = self.markers.get(id)?;
                Some(PendingMarker {
                    id: id.clone(),
                    address: marker.pending_address()?.to_string(),
                })
            })
            .take(limit)
            .collect()
    }

    /// Transition one marker from pending to resolved.
    ///
    /// Safe to call with stale or duplicate results: the first applied
    /// coordinate wins and later calls report `AlreadyResolved`.
    pub fn apply_resolution(&mut self, id: &MarkerId, coordinate: Coordinate) -> ResolutionOutcome {
        let Some(current) = self.markers.get(id) else {
            return ResolutionOutcome::NotFound;
        };
        if current.is_resolved() {
            return ResolutionOutcome::AlreadyResolved;
        }
        if !coordinate.is_usable() {
            return ResolutionOutcome::Rejected;
        }

        let updated = Arc::new(current.with_coordinate(coordinate));
        self.markers.insert(id.clone(), Arc::clone(&updated));
        // Copy-on-write: outstanding snapshots keep their own vector.
        Arc::make_mut(&mut self.resolved).push(updated);
        self.pending.retain(|pending_id| pending_id != id);
        ResolutionOutcome::Applied
    }

    pub fn get(&self, id: &MarkerId) -> Option<Arc<Marker>> {
        self.markers.get(id).cloned()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loaded: self.markers.len() + self.dropped,
            resolved: self.resolved.len(),
            pending: self.pending.len(),
            dropped: self.dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hm_core::marker::{RecordAddress, RecordCoordinates};

    fn located(id: &str, latitude: f64, longitude: f64) -> MarkerRecord {
        MarkerRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            coordinates: Some(RecordCoordinates {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }),
            ..Default::default()
        }
    }

    fn addressed(id: &str, city: &str, county: &str) -> MarkerRecord {
        MarkerRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            address: RecordAddress {
                city: city.to_string(),
                county: county.to_string(),
                state: "TX".to_string(),
            },
            ..Default::default()
        }
    }

    fn nowhere(id: &str) -> MarkerRecord {
        MarkerRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn scenario_store() -> MarkerStore {
        let mut store = MarkerStore::new();
        store.load(vec![
            located("a", 30.0, -97.0),
            addressed("b", "Austin", "Travis"),
            nowhere("c"),
        ]);
        store
    }

    #[test]
    fn test_load_partitions_records() {
        let mut store = MarkerStore::new();
        let outcome = store.load(vec![
            located("a", 30.0, -97.0),
            addressed("b", "Austin", "Travis"),
            nowhere("c"),
        ]);

        assert_eq!(
            outcome,
            LoadOutcome::Loaded(LoadSummary {
                resolved: 1,
                pending: 1,
                dropped: 1,
            })
        );
        let snapshot = store.resolved();
        let resolved: Vec<&str> = snapshot.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(resolved, vec!["a"]);
        assert_eq!(
            store.pending_batch(10),
            vec![PendingMarker {
                id: MarkerId::from("b"),
                address: "Austin, Travis, TX".to_string(),
            }]
        );
        assert_eq!(
            store.stats(),
            StoreStats {
                loaded: 3,
                resolved: 1,
                pending: 1,
                dropped: 1,
            }
        );
    }

    #[test]
    fn test_second_load_is_a_no_op() {
        let mut store = scenario_store();
        let outcome = store.load(vec![located("d", 1.0, 1.0)]);

        assert_eq!(outcome, LoadOutcome::AlreadyLoaded);
        assert!(store.get(&MarkerId::from("d")).is_none());
        assert_eq!(store.stats().loaded, 3);
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let mut store = MarkerStore::new();
        store.load(vec![located("a", 30.0, -97.0), located("a", 31.0, -98.0)]);

        assert_eq!(store.stats().dropped, 1);
        let a = store.get(&MarkerId::from("a")).unwrap();
        assert_eq!(a.coordinate(), Some(Coordinate::new(30.0, -97.0)));
    }

    #[test]
    fn test_pending_batch_respects_limit_and_keeps_markers_pending() {
        let mut store = MarkerStore::new();
        store.load(vec![
            addressed("p1", "Austin", ""),
            addressed("p2", "Waco", ""),
            addressed("p3", "Tyler", ""),
        ]);

        let batch = store.pending_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id.as_str(), "p1");
        assert_eq!(batch[1].id.as_str(), "p2");
        assert_eq!(store.pending_batch(10).len(), 3);
    }

    #[test]
    fn test_apply_resolution_moves_marker_to_resolved() {
        let mut store = scenario_store();
        let b = MarkerId::from("b");

        let outcome = store.apply_resolution(&b, Coordinate::new(30.1, -97.1));

        assert_eq!(outcome, ResolutionOutcome::Applied);
        let snapshot = store.resolved();
        let ids: Vec<&str> = snapshot.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.pending_batch(10).is_empty());
        assert_eq!(store.stats().pending, 0);
    }

    #[test]
    fn test_double_resolution_keeps_first_coordinate() {
        let mut store = scenario_store();
        let b = MarkerId::from("b");

        let first = store.apply_resolution(&b, Coordinate::new(30.1, -97.1));
        let second = store.apply_resolution(&b, Coordinate::new(35.0, -100.0));

        assert_eq!(first, ResolutionOutcome::Applied);
        assert_eq!(second, ResolutionOutcome::AlreadyResolved);
        assert_eq!(
            store.get(&b).unwrap().coordinate(),
            Some(Coordinate::new(30.1, -97.1))
        );
        let count = store.resolved().iter().filter(|m| m.id == b).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_and_already_resolved_ids_are_not_errors() {
        let mut store = scenario_store();
        assert_eq!(
            store.apply_resolution(&MarkerId::from("zzz"), Coordinate::new(1.0, 1.0)),
            ResolutionOutcome::NotFound
        );
        assert_eq!(
            store.apply_resolution(&MarkerId::from("a"), Coordinate::new(1.0, 1.0)),
            ResolutionOutcome::AlreadyResolved
        );
        // dropped records were never stored
        assert_eq!(
            store.apply_resolution(&MarkerId::from("c"), Coordinate::new(1.0, 1.0)),
            ResolutionOutcome::NotFound
        );
    }

    #[test]
    fn test_unusable_coordinate_is_rejected() {
        let mut store = scenario_store();
        let b = MarkerId::from("b");

        let outcome = store.apply_resolution(&b, Coordinate::new(f64::NAN, -97.1));

        assert_eq!(outcome, ResolutionOutcome::Rejected);
        assert_eq!(store.pending_batch(10).len(), 1);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_resolution() {
        let mut store = scenario_store();
        let before = store.resolved();

        store.apply_resolution(&MarkerId::from("b"), Coordinate::new(30.1, -97.1));

        assert_eq!(before.len(), 1);
        assert_eq!(store.resolved().len(), 2);
    }
}
