//! Position source that replays a fixed track.
//! 按固定间隔回放预设轨迹的位置源。

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use hm_core::ports::PositionSourcePort;
use hm_core::Coordinate;
use tokio::sync::mpsc;
use tracing::debug;

pub struct ScriptedPositionSource {
    track: Vec<Coordinate>,
    interval: Duration,
}

impl ScriptedPositionSource {
    pub fn new(track: Vec<Coordinate>, interval: Duration) -> Self {
        Self { track, interval }
    }
}

#[async_trait::async_trait]
impl PositionSourcePort for ScriptedPositionSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Coordinate>> {
        let (tx, rx) = mpsc::channel(16);
        let track = self.track.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            for (index, position) in track.into_iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(position).await.is_err() {
                    debug!("Position subscriber went away");
                    return;
                }
            }
        });
        Ok(rx)
    }
}

/// Read a track from a JSON array of `[latitude, longitude]` pairs.
pub fn load_positions(path: &Path) -> anyhow::Result<Vec<Coordinate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read position file: {}", path.display()))?;
    let pairs: Vec<(f64, f64)> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse position file: {}", path.display()))?;
    Ok(pairs
        .into_iter()
        .map(|(latitude, longitude)| Coordinate::new(latitude, longitude))
        .collect())
}
