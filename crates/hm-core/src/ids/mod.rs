//! ID type wrappers for type safety.

mod id_macro;
pub mod marker_id;

pub use marker_id::MarkerId;
