//! # hm-core
//!
//! Core domain models and ports for the historical marker engine.
//!
//! This crate contains pure domain logic without any infrastructure dependencies:
//! markers and their resolution state, geographic primitives, engine
//! configuration and the port traits implemented by adapters.

pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod ids;
pub mod marker;
pub mod ports;

// Re-export commonly used types at the crate root
pub use config::EngineConfig;
pub use error::EngineError;
pub use events::{EngineEvent, EngineStats, ProximityEvent, VisibleSet};
pub use geo::{BoundingBox, Coordinate, Region};
pub use ids::MarkerId;
pub use marker::{Marker, MarkerLocation, MarkerRecord};
