//! Adapters implementing the `hm-core` ports: record loading, HTTP geocoding,
//! position sources and event sinks.

pub mod config;
pub mod events;
pub mod geocoding;
pub mod ingest;
pub mod position;

pub use config::GeocoderConfig;
pub use events::{ChannelEventSink, TracingEventSink};
pub use geocoding::HttpGeocoder;
pub use ingest::{load_records, parse_records, RecordBatch};
pub use position::{load_positions, ScriptedPositionSource};
