//! Marker domain model and the ingestion record format.

mod marker;
mod record;

pub use marker::{Marker, MarkerLocation};
pub use record::{MarkerRecord, RecordAddress, RecordCoordinates};
