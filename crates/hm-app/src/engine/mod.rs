//! Marker engine actor.
//! 标记引擎 Actor：唯一持有标记存储、可见集与播报记录的所有者。
//!
//! The actor task owns the [`MarkerStore`](crate::store::MarkerStore), the
//! current Visible Set and the Proximity Record. Callers talk to it through a
//! cloneable [`MarkerEngine`] handle; background work (geocoding tasks,
//! offloaded filter scans) reports back over channels instead of touching
//! shared state.

mod actor;
mod command;
mod handle;

pub use handle::{EnginePorts, MarkerEngine};
