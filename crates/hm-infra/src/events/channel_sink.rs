use hm_core::ports::EngineEventPort;
use hm_core::EngineEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Forwards engine events into an mpsc channel.
///
/// Never waits for the receiver: when the channel is full the event is
/// dropped, so a consumer that stops draining cannot stall the engine.
pub struct ChannelEventSink {
    sender: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(sender: mpsc::Sender<EngineEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait::async_trait]
impl EngineEventPort for ChannelEventSink {
    async fn emit(&self, event: EngineEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("Event channel full; dropping engine event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver closed; dropping engine event");
            }
        }
    }
}
