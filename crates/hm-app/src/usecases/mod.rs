//! Engine use cases
//!
//! Each use case is plain state plus logic; the engine actor decides when to
//! call them and routes their results.
//!
//! [MarkerStore]
//!        ↓ pending batch
//! ResolvePendingMarkers (GeocodingCoordinator) → resolved addresses → store
//!        ↓ resolved snapshot
//! FilterViewport (ViewportFilter)              → Visible Set → map
//!        ↓ visible markers
//! DetectProximity (ProximityDetector)          → proximity events → speech

pub mod detect_proximity;
pub mod filter_viewport;
pub mod resolve_pending_markers;

pub use detect_proximity::ProximityDetector;
pub use filter_viewport::{FilterRequest, PublishOutcome, ViewportFilter};
pub use resolve_pending_markers::{GeocodingCoordinator, GeocodingTask, ResolvedAddress};
