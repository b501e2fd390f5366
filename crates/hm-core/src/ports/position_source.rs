use tokio::sync::mpsc;

use crate::geo::Coordinate;

/// Push source of live device positions.
///
/// Subscribing fails when the location capability is unavailable (not
/// granted, no hardware); the engine then leaves proximity detection inert.
#[async_trait::async_trait]
pub trait PositionSourcePort: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Coordinate>>;
}
