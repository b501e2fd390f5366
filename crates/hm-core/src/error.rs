use thiserror::Error;

/// Errors surfaced by the engine handle.
///
/// Per-marker failures (unresolvable records, geocoding errors, stale filter
/// results) are contained inside the engine and never show up here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine actor has stopped and no longer accepts commands.
    #[error("marker engine is closed")]
    Closed,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
