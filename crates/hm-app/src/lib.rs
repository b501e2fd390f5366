//! Marker visibility and proximity engine
//!
//! This crate contains the marker store, the use cases that operate on it
//! (geocoding, viewport filtering, proximity detection) and the engine actor
//! that owns them.
//!
//! ```text
//! ingestion ──load──▶ MarkerEngine (actor)
//!                         │  owns MarkerStore, ViewportFilter, ProximityDetector
//!   GeocodingCoordinator ─┤◀─ resolved addresses (mpsc)
//!   filter scans        ──┤◀─ completed scans (mpsc)
//!                         ▼
//!                   EngineEventPort (visible sets, proximity events)
//! ```

pub mod engine;
pub mod store;
pub mod usecases;

pub use engine::{EnginePorts, MarkerEngine};
pub use store::{LoadOutcome, LoadSummary, MarkerSnapshot, MarkerStore, ResolutionOutcome};
