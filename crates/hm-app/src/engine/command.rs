use std::sync::Arc;

use hm_core::{Coordinate, EngineStats, Marker, MarkerRecord, Region, VisibleSet};
use tokio::sync::oneshot;

use crate::store::LoadOutcome;

/// Messages accepted by the engine actor.
pub(crate) enum EngineCommand {
    Load {
        records: Vec<MarkerRecord>,
        reply: oneshot::Sender<LoadOutcome>,
    },
    StartGeocoding {
        reply: oneshot::Sender<usize>,
    },
    UpdateViewport {
        region: Region,
    },
    Position {
        position: Coordinate,
    },
    VisibleSet {
        reply: oneshot::Sender<Option<VisibleSet>>,
    },
    Stats {
        reply: oneshot::Sender<EngineStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Result of an offloaded filter scan. `markers` is `None` if the scan was
/// cancelled.
pub(crate) struct FilterCompletion {
    pub seq: u64,
    pub region: Region,
    pub markers: Option<Vec<Arc<Marker>>>,
}
