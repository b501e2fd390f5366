//! Viewport filtering with last-request-wins publication.
//! 视口过滤：只发布最新一次请求的结果。
//!
//! Every [`ViewportFilter::request`] gets a sequence number and a fresh
//! cancellation token; the previous request's token is cancelled. A finished
//! scan is published only if its sequence number is still the latest, so a
//! slow scan for an old region can never overwrite a newer Visible Set.

use std::sync::Arc;

use hm_core::{BoundingBox, Marker, Region, VisibleSet};
use tokio_util::sync::CancellationToken;

use crate::store::MarkerSnapshot;

/// How many markers are scanned between cancellation checks.
const CANCEL_CHECK_STRIDE: usize = 1024;

/// One scan to run, either inline or on a blocking worker.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub seq: u64,
    pub region: Region,
    pub bounds: BoundingBox,
    pub snapshot: MarkerSnapshot,
    pub cancel: CancellationToken,
}

impl FilterRequest {
    /// Markers of the snapshot inside the buffered bounds, in snapshot order.
    ///
    /// Returns `None` if the request was superseded while scanning.
    pub fn scan(&self) -> Option<Vec<Arc<Marker>>> {
        let mut hits = Vec::new();
        for (index, marker) in self.snapshot.iter().enumerate() {
            if index % CANCEL_CHECK_STRIDE == 0 && self.cancel.is_cancelled() {
                return None;
            }
            if let Some(coordinate) = marker.coordinate() {
                if self.bounds.contains(&coordinate) {
                    hits.push(Arc::clone(marker));
                }
            }
        }
        Some(hits)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published(VisibleSet),
    /// A newer request exists; the result was discarded.
    Stale,
}

#[derive(Debug)]
struct Published {
    region: Region,
    markers: Vec<Arc<Marker>>,
}

#[derive(Debug)]
pub struct ViewportFilter {
    buffer_factor: f64,
    latest_seq: u64,
    last_region: Option<Region>,
    in_flight: Option<CancellationToken>,
    current: Option<Published>,
}

impl ViewportFilter {
    pub fn new(buffer_factor: f64) -> Self {
        Self {
            buffer_factor,
            latest_seq: 0,
            last_region: None,
            in_flight: None,
            current: None,
        }
    }

    /// Register a new region and build the scan for it. Cancels whatever scan
    /// is still running.
    pub fn request(&mut self, region: Region, snapshot: MarkerSnapshot) -> FilterRequest {
        self.cancel_in_flight();

        self.latest_seq += 1;
        self.last_region = Some(region);
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());

        FilterRequest {
            seq: self.latest_seq,
            region,
            bounds: region.buffered_bounds(self.buffer_factor),
            snapshot,
            cancel,
        }
    }

    /// Re-run the filter for the last requested region against a newer
    /// snapshot. `None` if no region was ever requested.
    pub fn refresh(&mut self, snapshot: MarkerSnapshot) -> Option<FilterRequest> {
        let region = self.last_region?;
        Some(self.request(region, snapshot))
    }

    /// Try to make a finished scan the current Visible Set.
    pub fn publish(&mut self, seq: u64, region: Region, markers: Vec<Arc<Marker>>) -> PublishOutcome {
        if seq != self.latest_seq {
            return PublishOutcome::Stale;
        }
        self.in_flight = None;

        let visible = VisibleSet {
            region,
            marker_ids: markers.iter().map(|marker| marker.id.clone()).collect(),
        };
        self.current = Some(Published { region, markers });
        PublishOutcome::Published(visible)
    }

    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn last_region(&self) -> Option<Region> {
        self.last_region
    }

    /// Markers of the current Visible Set, in Visible-Set order.
    pub fn current_markers(&self) -> &[Arc<Marker>] {
        self.current
            .as_ref()
            .map(|published| published.markers.as_slice())
            .unwrap_or(&[])
    }

    pub fn visible_set(&self) -> Option<VisibleSet> {
        self.current.as_ref().map(|published| VisibleSet {
            region: published.region,
            marker_ids: published
                .markers
                .iter()
                .map(|marker| marker.id.clone())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hm_core::{Coordinate, MarkerId};

    fn snapshot(markers: Vec<Marker>) -> MarkerSnapshot {
        Arc::new(markers.into_iter().map(Arc::new).collect())
    }

    fn ids(markers: &[Arc<Marker>]) -> Vec<&str> {
        markers.iter().map(|m| m.id.as_str()).collect()
    }

    fn region(latitude: f64, longitude: f64, span: f64) -> Region {
        Region::new(Coordinate::new(latitude, longitude), span, span)
    }

    #[test]
    fn test_scan_uses_closed_buffered_bounds() {
        // span 2.0 * 1.5 => box [-1.5, 1.5] on both axes
        let markers = snapshot(vec![
            Marker::resolved("inside", "", Coordinate::new(0.5, 0.5)),
            Marker::resolved("corner", "", Coordinate::new(1.5, -1.5)),
            Marker::resolved("buffer", "", Coordinate::new(1.2, 0.0)),
            Marker::resolved("outside_lat", "", Coordinate::new(1.51, 0.0)),
            Marker::resolved("outside_lon", "", Coordinate::new(0.0, -1.51)),
        ]);
        let mut filter = ViewportFilter::new(1.5);

        let request = filter.request(region(0.0, 0.0, 2.0), markers);
        let hits = request.scan().unwrap();

        assert_eq!(ids(&hits), vec!["inside", "corner", "buffer"]);
    }

    #[test]
    fn test_pending_markers_are_never_visible() {
        let markers = snapshot(vec![
            Marker::pending("p", "", "Austin, Travis, TX"),
            Marker::resolved("r", "", Coordinate::new(0.0, 0.0)),
        ]);
        let mut filter = ViewportFilter::new(1.5);

        let hits = filter.request(region(0.0, 0.0, 180.0), markers).scan().unwrap();

        assert_eq!(ids(&hits), vec!["r"]);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let markers = snapshot(vec![
            Marker::resolved("west", "", Coordinate::new(0.0, -10.0)),
            Marker::resolved("east", "", Coordinate::new(0.0, 10.0)),
        ]);
        let mut filter = ViewportFilter::new(1.5);

        let request_a = filter.request(region(0.0, -10.0, 1.0), Arc::clone(&markers));
        let request_b = filter.request(region(0.0, 10.0, 1.0), Arc::clone(&markers));

        // B finishes first, A straggles in afterwards.
        let result_b = request_b.scan().unwrap();
        let outcome_b = filter.publish(request_b.seq, request_b.region, result_b);
        let result_a = filter_scan_ignoring_cancel(&request_a);
        let outcome_a = filter.publish(request_a.seq, request_a.region, result_a);

        assert!(matches!(outcome_b, PublishOutcome::Published(_)));
        assert_eq!(outcome_a, PublishOutcome::Stale);
        let visible = filter.visible_set().unwrap();
        assert_eq!(visible.region, request_b.region);
        assert_eq!(visible.marker_ids, vec![MarkerId::from("east")]);
    }

    fn filter_scan_ignoring_cancel(request: &FilterRequest) -> Vec<Arc<Marker>> {
        let uncancelled = FilterRequest {
            cancel: CancellationToken::new(),
            ..request.clone()
        };
        uncancelled.scan().unwrap()
    }

    #[test]
    fn test_new_request_cancels_previous_scan() {
        let markers = snapshot(vec![Marker::resolved("a", "", Coordinate::new(0.0, 0.0))]);
        let mut filter = ViewportFilter::new(1.5);

        let first = filter.request(region(0.0, 0.0, 1.0), Arc::clone(&markers));
        let second = filter.request(region(1.0, 1.0, 1.0), markers);

        assert!(first.cancel.is_cancelled());
        assert!(first.scan().is_none());
        assert!(!second.cancel.is_cancelled());
        assert_eq!(second.seq, first.seq + 1);
    }

    #[test]
    fn test_refresh_without_region_is_a_no_op() {
        let mut filter = ViewportFilter::new(1.5);
        assert!(filter.refresh(snapshot(vec![])).is_none());
        assert_eq!(filter.latest_seq(), 0);
    }

    #[test]
    fn test_refresh_reuses_last_region() {
        let mut filter = ViewportFilter::new(1.5);
        let first = filter.request(region(5.0, 5.0, 1.0), snapshot(vec![]));

        let refreshed = filter
            .refresh(snapshot(vec![Marker::resolved("n", "", Coordinate::new(5.0, 5.0))]))
            .unwrap();

        assert_eq!(refreshed.region, first.region);
        assert!(refreshed.seq > first.seq);
        assert_eq!(ids(&refreshed.scan().unwrap()), vec!["n"]);
    }

    #[test]
    fn test_current_markers_empty_before_first_publish() {
        let filter = ViewportFilter::new(1.5);
        assert!(filter.current_markers().is_empty());
        assert!(filter.visible_set().is_none());
    }
}
