use std::ops::ControlFlow;
use std::sync::Arc;

use hm_core::ports::{EngineEventPort, GeocoderPort};
use hm_core::{Coordinate, EngineConfig, EngineEvent, EngineStats, MarkerRecord, Region};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace};

use super::command::{EngineCommand, FilterCompletion};
use crate::store::{LoadOutcome, MarkerStore, ResolutionOutcome};
use crate::usecases::{
    FilterRequest, GeocodingCoordinator, GeocodingTask, ProximityDetector, PublishOutcome,
    ResolvedAddress, ViewportFilter,
};

enum GeocodingState {
    NotStarted,
    Running(GeocodingTask),
    /// Started without a geocoder, or already torn down.
    Inert,
}

pub(crate) struct EngineActor {
    config: EngineConfig,
    store: MarkerStore,
    filter: ViewportFilter,
    detector: ProximityDetector,
    geocoder: Option<Arc<dyn GeocoderPort>>,
    events: Arc<dyn EngineEventPort>,
    geocoding: GeocodingState,
    resolution_tx: mpsc::Sender<ResolvedAddress>,
    filter_tx: mpsc::Sender<FilterCompletion>,
    shutdown: CancellationToken,
}

pub(crate) struct ActorChannels {
    pub commands: mpsc::Receiver<EngineCommand>,
    pub resolutions: mpsc::Receiver<ResolvedAddress>,
    pub filter_results: mpsc::Receiver<FilterCompletion>,
}

impl EngineActor {
    pub(crate) fn new(
        config: EngineConfig,
        geocoder: Option<Arc<dyn GeocoderPort>>,
        events: Arc<dyn EngineEventPort>,
        shutdown: CancellationToken,
        commands: mpsc::Receiver<EngineCommand>,
    ) -> (Self, ActorChannels) {
        let capacity = config.command_buffer;
        let (resolution_tx, resolutions) = mpsc::channel(capacity);
        let (filter_tx, filter_results) = mpsc::channel(capacity);

        let actor = Self {
            filter: ViewportFilter::new(config.viewport_buffer_factor),
            detector: ProximityDetector::new(config.proximity_radius_m),
            config,
            store: MarkerStore::new(),
            geocoder,
            events,
            geocoding: GeocodingState::NotStarted,
            resolution_tx,
            filter_tx,
            shutdown,
        };
        let channels = ActorChannels {
            commands,
            resolutions,
            filter_results,
        };
        (actor, channels)
    }

    /// Run until shutdown is requested or every handle is dropped.
    pub(crate) async fn run(mut self, mut channels: ActorChannels) {
        info!("Marker engine started");
        loop {
            tokio::select! {
                command = channels.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All engine handles dropped");
                        break;
                    };
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }
                Some(resolved) = channels.resolutions.recv() => {
                    self.on_resolved(resolved).await;
                }
                Some(completion) = channels.filter_results.recv() => {
                    self.on_filter_completed(completion).await;
                }
            }
        }
        self.teardown().await;
        info!("Marker engine stopped");
    }

    async fn handle_command(&mut self, command: EngineCommand) -> ControlFlow<()> {
        match command {
            EngineCommand::Load { records, reply } => {
                let outcome = self.load(records);
                let _ = reply.send(outcome);
            }
            EngineCommand::StartGeocoding { reply } => {
                let scheduled = self.start_geocoding();
                let _ = reply.send(scheduled);
            }
            EngineCommand::UpdateViewport { region } => {
                self.update_viewport(region).await;
            }
            EngineCommand::Position { position } => {
                self.on_position(position).await;
            }
            EngineCommand::VisibleSet { reply } => {
                let _ = reply.send(self.filter.visible_set());
            }
            EngineCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            EngineCommand::Shutdown { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn load(&mut self, records: Vec<MarkerRecord>) -> LoadOutcome {
        let _span = info_span!("engine.load", records = records.len()).entered();
        let outcome = self.store.load(records);
        match outcome {
            LoadOutcome::Loaded(summary) => info!(
                resolved = summary.resolved,
                pending = summary.pending,
                dropped = summary.dropped,
                "Markers loaded"
            ),
            LoadOutcome::AlreadyLoaded => debug!("Markers already loaded; ignoring"),
        }
        outcome
    }

    fn start_geocoding(&mut self) -> usize {
        if !matches!(self.geocoding, GeocodingState::NotStarted) {
            debug!("Geocoding batch already selected; not re-polling");
            return 0;
        }
        if !self.store.is_loaded() {
            debug!("No markers loaded yet; geocoding batch not selected");
            return 0;
        }
        let Some(geocoder) = self.geocoder.clone() else {
            info!("No geocoder configured; pending markers stay unresolved");
            self.geocoding = GeocodingState::Inert;
            return 0;
        };

        let batch = self.store.pending_batch(self.config.geocode_batch_size);
        let coordinator = GeocodingCoordinator::new(
            geocoder,
            self.config.geocode_stagger(),
            self.config.geocode_timeout(),
        );
        let task = coordinator.start(batch, self.resolution_tx.clone());
        let scheduled = task.scheduled();
        self.geocoding = GeocodingState::Running(task);
        scheduled
    }

    async fn update_viewport(&mut self, region: Region) {
        let request = self.filter.request(region, self.store.resolved());
        self.run_filter(request).await;
    }

    async fn run_filter(&mut self, request: FilterRequest) {
        if request.snapshot.len() < self.config.filter_offload_threshold {
            let completion = FilterCompletion {
                seq: request.seq,
                region: request.region,
                markers: request.scan(),
            };
            self.on_filter_completed(completion).await;
            return;
        }

        let filter_tx = self.filter_tx.clone();
        tokio::task::spawn_blocking(move || {
            let completion = FilterCompletion {
                seq: request.seq,
                region: request.region,
                markers: request.scan(),
            };
            // Engine gone: nobody is waiting for the result.
            let _ = filter_tx.blocking_send(completion);
        });
    }

    async fn on_filter_completed(&mut self, completion: FilterCompletion) {
        let Some(markers) = completion.markers else {
            trace!(seq = completion.seq, "Filter scan cancelled");
            return;
        };
        match self.filter.publish(completion.seq, completion.region, markers) {
            PublishOutcome::Published(visible) => {
                debug!(
                    seq = completion.seq,
                    visible = visible.len(),
                    "Visible set published"
                );
                self.events.emit(EngineEvent::VisibleSetChanged(visible)).await;
            }
            PublishOutcome::Stale => {
                trace!(
                    seq = completion.seq,
                    latest = self.filter.latest_seq(),
                    "Discarding superseded filter result"
                );
            }
        }
    }

    async fn on_resolved(&mut self, resolved: ResolvedAddress) {
        match self
            .store
            .apply_resolution(&resolved.marker_id, resolved.coordinate)
        {
            ResolutionOutcome::Applied => {
                debug!(
                    marker_id = %resolved.marker_id,
                    coordinate = %resolved.coordinate,
                    "Marker resolved"
                );
                if let Some(request) = self.filter.refresh(self.store.resolved()) {
                    self.run_filter(request).await;
                }
            }
            ResolutionOutcome::Rejected => {
                debug!(
                    marker_id = %resolved.marker_id,
                    coordinate = %resolved.coordinate,
                    "Geocoder returned an unusable coordinate; marker stays pending"
                );
            }
            outcome => {
                trace!(marker_id = %resolved.marker_id, ?outcome, "Resolution ignored");
            }
        }
    }

    async fn on_position(&mut self, position: Coordinate) {
        let events = self
            .detector
            .evaluate(&position, self.filter.current_markers());
        for event in events {
            info!(
                marker_id = %event.marker_id(),
                distance_m = event.distance_m,
                "Marker in range"
            );
            self.events.emit(EngineEvent::ProximityReached(event)).await;
        }
    }

    fn stats(&self) -> EngineStats {
        let store = self.store.stats();
        EngineStats {
            loaded: store.loaded,
            resolved: store.resolved,
            pending: store.pending,
            dropped: store.dropped,
            visible: self.filter.current_markers().len(),
            announced: self.detector.announced_count(),
        }
    }

    async fn teardown(&mut self) {
        self.shutdown.cancel();
        self.filter.cancel_in_flight();
        if let GeocodingState::Running(task) =
            std::mem::replace(&mut self.geocoding, GeocodingState::Inert)
        {
            task.shutdown().await;
        }
    }
}
