//! Port interfaces for the engine
//!
//! Ports define the contract between the engine (use cases) and the external
//! collaborators: the geocoding service, the device location subsystem and the
//! consumers of engine output (map rendering, speech). The engine depends only
//! on these traits, never on concrete platform APIs.

mod engine_event;
mod geocoder;
mod position_source;

pub use engine_event::EngineEventPort;
pub use geocoder::{GeocodeError, GeocoderPort};
pub use position_source::PositionSourcePort;
