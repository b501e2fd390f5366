//! Staggered background geocoding of pending markers.
//! 对待解析标记进行错峰的后台地理编码。
//!
//! ```text
//! batch[0] ── t=0 ──────▶ resolve_address ──▶ ResolvedAddress ─┐
//! batch[1] ── t=1×stride ▶ resolve_address ──▶ (failure: logged) │──▶ engine
//! batch[2] ── t=2×stride ▶ resolve_address ──▶ ResolvedAddress ─┘
//! ```
//!
//! Every marker of the batch gets its own task with exactly one stagger delay,
//! which bounds the request rate to one per stride no matter how large the
//! batch is. All tasks share one [`CancellationToken`]; cancelling it abandons
//! the remaining staggers and in-flight calls.

use std::sync::Arc;
use std::time::Duration;

use hm_core::ports::{GeocodeError, GeocoderPort};
use hm_core::{Coordinate, MarkerId};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::store::PendingMarker;

/// Successful geocoding result, sent back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAddress {
    pub marker_id: MarkerId,
    pub coordinate: Coordinate,
}

pub struct GeocodingCoordinator {
    geocoder: Arc<dyn GeocoderPort>,
    stride: Duration,
    call_timeout: Duration,
}

impl GeocodingCoordinator {
    pub fn new(geocoder: Arc<dyn GeocoderPort>, stride: Duration, call_timeout: Duration) -> Self {
        Self {
            geocoder,
            stride,
            call_timeout,
        }
    }

    /// Schedule one staggered resolution per marker of `batch`.
    ///
    /// The batch is fixed at this point; markers that become pending later are
    /// not picked up.
    pub fn start(
        &self,
        batch: Vec<PendingMarker>,
        results: mpsc::Sender<ResolvedAddress>,
    ) -> GeocodingTask {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let started_at = Instant::now();
        let scheduled = batch.len();

        info!(
            batch_size = scheduled,
            stride_ms = self.stride.as_millis() as u64,
            "Starting staggered geocoding batch"
        );

        for (index, pending) in batch.into_iter().enumerate() {
            let offset = self
                .stride
                .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            let release_at = started_at + offset;
            let span = info_span!(
                "usecase.resolve_pending_markers.resolve",
                marker_id = %pending.id,
                index,
            );
            tasks.spawn(
                resolve_one(
                    Arc::clone(&self.geocoder),
                    pending,
                    release_at,
                    self.call_timeout,
                    cancel.clone(),
                    results.clone(),
                )
                .instrument(span),
            );
        }

        GeocodingTask {
            cancel,
            tasks,
            scheduled,
        }
    }
}

async fn resolve_one(
    geocoder: Arc<dyn GeocoderPort>,
    pending: PendingMarker,
    release_at: Instant,
    call_timeout: Duration,
    cancel: CancellationToken,
    results: mpsc::Sender<ResolvedAddress>,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = sleep_until(release_at) => {}
    }

    let outcome = tokio::select! {
        _ = cancel.cancelled() => return,
        outcome = timeout(call_timeout, geocoder.resolve_address(&pending.address)) => outcome,
    };

    let coordinate = match outcome {
        Ok(Ok(coordinate)) => coordinate,
        Ok(Err(err)) => {
            log_failure(&pending, &err);
            return;
        }
        Err(_) => {
            log_failure(&pending, &GeocodeError::Timeout);
            return;
        }
    };

    let resolved = ResolvedAddress {
        marker_id: pending.id,
        coordinate,
    };
    tokio::select! {
        _ = cancel.cancelled() => {}
        sent = results.send(resolved) => {
            if sent.is_err() {
                debug!("Engine closed before geocoding result could be applied");
            }
        }
    }
}

// Partial failure is expected for a batch; keep it out of the default log level.
fn log_failure(pending: &PendingMarker, err: &GeocodeError) {
    debug!(
        address = %pending.address,
        error = %err,
        "Geocoding failed; marker stays pending"
    );
}

/// Handle to a running geocoding batch.
///
/// Dropping the handle aborts every task of the batch.
pub struct GeocodingTask {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    scheduled: usize,
}

impl GeocodingTask {
    /// Number of markers selected into the batch.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    /// Wait until every marker of the batch has been attempted.
    pub async fn join(mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Cancel outstanding staggers and wait for the tasks to wind down.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}
    }
}

impl Drop for GeocodingTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Geocoder that records when each call started.
    struct RecordingGeocoder {
        started: Mutex<Vec<(String, Instant)>>,
        delay: Duration,
    }

    impl RecordingGeocoder {
        fn new(delay: Duration) -> Self {
            Self {
                started: Mutex::new(Vec::new()),
                delay,
            }
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeocoderPort for RecordingGeocoder {
        async fn resolve_address(&self, address: &str) -> Result<Coordinate, GeocodeError> {
            self.started
                .lock()
                .unwrap()
                .push((address.to_string(), Instant::now()));
            tokio::time::sleep(self.delay).await;
            match address {
                "nowhere" => Err(GeocodeError::NotFound(address.to_string())),
                _ => Ok(Coordinate::new(30.0, -97.0)),
            }
        }
    }

    fn batch(addresses: &[&str]) -> Vec<PendingMarker> {
        addresses
            .iter()
            .enumerate()
            .map(|(i, address)| PendingMarker {
                id: MarkerId::from(format!("m{i}")),
                address: address.to_string(),
            })
            .collect()
    }

    fn coordinator(geocoder: Arc<RecordingGeocoder>) -> GeocodingCoordinator {
        GeocodingCoordinator::new(
            geocoder,
            Duration::from_millis(200),
            Duration::from_secs(10),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_staggered_by_stride() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let (tx, mut rx) = mpsc::channel(16);
        let origin = Instant::now();

        let task = coordinator(geocoder.clone()).start(batch(&["a", "b", "c", "d"]), tx);
        task.join().await;

        let offsets: Vec<u128> = geocoder
            .calls()
            .iter()
            .map(|(_, at)| at.duration_since(origin).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 200, 400, 600]);

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_never_exceed_rate_bound() {
        let stride = Duration::from_millis(200);
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::from_millis(50)));
        let (tx, _rx) = mpsc::channel(64);
        let origin = Instant::now();

        let task = coordinator(geocoder.clone()).start(batch(&["x"; 20]), tx);

        for step in 1..=30u64 {
            tokio::time::sleep(Duration::from_millis(73)).await;
            let elapsed = Instant::now().duration_since(origin);
            let bound = (elapsed.as_millis() as f64 / stride.as_millis() as f64).ceil() as usize + 1;
            let attempts = geocoder.calls().len();
            assert!(
                attempts <= bound,
                "step {step}: {attempts} attempts after {elapsed:?}, bound {bound}"
            );
        }
        task.join().await;
        assert_eq!(geocoder.calls().len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_swallowed() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let (tx, mut rx) = mpsc::channel(16);

        let task = coordinator(geocoder.clone()).start(batch(&["nowhere", "austin"]), tx);
        task.join().await;

        let resolved = rx.try_recv().unwrap();
        assert_eq!(resolved.marker_id.as_str(), "m1");
        assert!(rx.try_recv().is_err());
        assert_eq!(geocoder.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_without_result() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::from_secs(60)));
        let (tx, mut rx) = mpsc::channel(16);
        let coordinator = GeocodingCoordinator::new(
            geocoder.clone(),
            Duration::from_millis(200),
            Duration::from_secs(1),
        );

        let task = coordinator.start(batch(&["slow"]), tx);
        task.join().await;

        assert_eq!(geocoder.calls().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_outstanding_staggers() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let (tx, mut rx) = mpsc::channel(16);

        let task = coordinator(geocoder.clone()).start(batch(&["a", "b", "c", "d", "e"]), tx);
        // releases at 0, 200, 400 have happened by 450ms
        tokio::time::sleep(Duration::from_millis(450)).await;
        task.shutdown().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(geocoder.calls().len(), 3);
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_batch() {
        let geocoder = Arc::new(RecordingGeocoder::new(Duration::ZERO));
        let (tx, _rx) = mpsc::channel(16);

        let task = coordinator(geocoder.clone()).start(batch(&["a", "b", "c"]), tx);
        assert_eq!(task.scheduled(), 3);
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(geocoder.calls().len() <= 1);
    }
}
