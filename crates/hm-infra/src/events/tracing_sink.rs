use hm_core::ports::EngineEventPort;
use hm_core::EngineEvent;
use tracing::{debug, info};

/// Logs engine events. Stands in for the map and speech collaborators when
/// running headless.
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait::async_trait]
impl EngineEventPort for TracingEventSink {
    async fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::VisibleSetChanged(visible) => {
                debug!(
                    visible = visible.len(),
                    center = %visible.region.center,
                    "Visible set changed"
                );
            }
            EngineEvent::ProximityReached(event) => {
                info!(
                    marker_id = %event.marker_id(),
                    title = %event.marker.title,
                    distance_m = event.distance_m,
                    "Announcing marker"
                );
            }
        }
    }
}
