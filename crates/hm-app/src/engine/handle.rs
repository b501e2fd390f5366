use std::sync::Arc;

use hm_core::ports::{EngineEventPort, GeocoderPort, PositionSourcePort};
use hm_core::{Coordinate, EngineConfig, EngineError, EngineStats, MarkerRecord, Region, VisibleSet};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use super::actor::EngineActor;
use super::command::EngineCommand;
use crate::store::LoadOutcome;

/// Capabilities injected into the engine.
///
/// `geocoder` is optional: without it pending markers simply stay pending.
#[derive(Clone)]
pub struct EnginePorts {
    pub geocoder: Option<Arc<dyn GeocoderPort>>,
    pub events: Arc<dyn EngineEventPort>,
}

/// Cloneable handle to a running marker engine.
///
/// Every method is a message to the actor. Methods that return data wait for
/// the actor's reply, so they also act as a barrier: when they return, every
/// message sent earlier from this handle has been handled.
#[derive(Clone)]
pub struct MarkerEngine {
    commands: mpsc::Sender<EngineCommand>,
    shutdown: CancellationToken,
}

impl MarkerEngine {
    /// Spawn the engine actor on the current tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        ports: EnginePorts,
    ) -> Result<(Self, JoinHandle<()>), EngineError> {
        config.validate()?;

        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer);
        let shutdown = CancellationToken::new();
        let (actor, channels) = EngineActor::new(
            config,
            ports.geocoder,
            ports.events,
            shutdown.clone(),
            commands_rx,
        );
        let join = tokio::spawn(actor.run(channels).instrument(info_span!("engine.actor")));

        Ok((
            Self {
                commands: commands_tx,
                shutdown,
            },
            join,
        ))
    }

    /// Hand the parsed marker list to the store. Only the first call loads.
    pub async fn load(&self, records: Vec<MarkerRecord>) -> Result<LoadOutcome, EngineError> {
        self.request(|reply| EngineCommand::Load { records, reply })
            .await
    }

    /// Select the one-shot geocoding batch and start resolving it.
    ///
    /// Returns the number of markers scheduled; `0` on repeated calls or when
    /// no geocoder is configured.
    pub async fn start_geocoding(&self) -> Result<usize, EngineError> {
        self.request(|reply| EngineCommand::StartGeocoding { reply })
            .await
    }

    pub async fn update_viewport(&self, region: Region) -> Result<(), EngineError> {
        self.send(EngineCommand::UpdateViewport { region }).await
    }

    pub async fn on_position(&self, position: Coordinate) -> Result<(), EngineError> {
        self.send(EngineCommand::Position { position }).await
    }

    pub async fn visible_set(&self) -> Result<Option<VisibleSet>, EngineError> {
        self.request(|reply| EngineCommand::VisibleSet { reply })
            .await
    }

    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        self.request(|reply| EngineCommand::Stats { reply }).await
    }

    /// Forward positions from `source` into the engine until the source ends
    /// or the engine shuts down.
    ///
    /// Returns `false` (and leaves proximity detection inert) when the source
    /// cannot be subscribed to.
    pub async fn attach_position_source(
        &self,
        source: Arc<dyn PositionSourcePort>,
    ) -> Result<bool, EngineError> {
        if self.shutdown.is_cancelled() {
            return Err(EngineError::Closed);
        }
        let mut positions = match source.subscribe().await {
            Ok(positions) => positions,
            Err(err) => {
                warn!(error = %err, "Position source unavailable; proximity detection inert");
                return Ok(false);
            }
        };

        let engine = self.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(
            async move {
                loop {
                    let position = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        position = positions.recv() => position,
                    };
                    let Some(position) = position else {
                        debug!("Position source ended");
                        break;
                    };
                    if engine.on_position(position).await.is_err() {
                        break;
                    }
                }
            }
            .instrument(info_span!("engine.position_pump")),
        );
        Ok(true)
    }

    /// Stop the engine: cancels geocoding, in-flight filter scans and position
    /// pumps. Later calls on any handle return [`EngineError::Closed`].
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::Shutdown { reply })
            .await
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx.await.map_err(|_| EngineError::Closed)
    }
}
