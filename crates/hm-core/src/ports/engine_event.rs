use crate::events::EngineEvent;

/// Sink for engine output.
///
/// Events are delivered in the order the engine produces them. Implementations
/// should not block for long: the engine awaits each delivery before handling
/// its next command.
#[async_trait::async_trait]
pub trait EngineEventPort: Send + Sync {
    async fn emit(&self, event: EngineEvent);
}
