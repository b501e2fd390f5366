//! Geographic primitives: coordinates, viewport regions and great-circle
//! distance.

mod bounds;
mod coordinate;
mod distance;

pub use bounds::{BoundingBox, Region};
pub use coordinate::Coordinate;
pub use distance::{haversine_distance_m, EARTH_RADIUS_M};
