use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Visible map region: a center plus the visible span on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub const fn new(center: Coordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            center,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Inclusive bounding box of the region scaled by `buffer_factor` on each
    /// axis around its center.
    ///
    /// 按缓冲系数在每个轴上扩展后的闭区间包围盒。
    pub fn buffered_bounds(&self, buffer_factor: f64) -> BoundingBox {
        let half_lat = self.latitude_delta.abs() * buffer_factor / 2.0;
        let half_lon = self.longitude_delta.abs() * buffer_factor / 2.0;
        BoundingBox {
            min_lat: self.center.latitude - half_lat,
            max_lat: self.center.latitude + half_lat,
            min_lon: self.center.longitude - half_lon,
            max_lon: self.center.longitude + half_lon,
        }
    }
}

/// Axis-aligned box with closed intervals on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        coordinate.latitude >= self.min_lat
            && coordinate.latitude <= self.max_lat
            && coordinate.longitude >= self.min_lon
            && coordinate.longitude <= self.max_lon
    }
}
