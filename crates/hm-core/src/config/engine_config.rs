use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tunables of the marker engine.
///
/// Missing fields fall back to [`EngineConfig::default`], so a partial TOML
/// section is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 单次地理编码批次的最大标记数
    pub geocode_batch_size: usize,
    /// Delay between successive geocoding releases in a batch.
    pub geocode_stagger_ms: u64,
    /// Upper bound on a single geocoding call.
    pub geocode_timeout_ms: u64,
    /// Scale applied to the viewport span on each axis.
    pub viewport_buffer_factor: f64,
    /// 播报半径（米）
    pub proximity_radius_m: f64,
    /// Snapshots at least this large are scanned on a blocking worker.
    pub filter_offload_threshold: usize,
    /// Capacity of the engine command channel.
    pub command_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geocode_batch_size: 50,
            geocode_stagger_ms: 200,
            geocode_timeout_ms: 10_000,
            viewport_buffer_factor: 1.5,
            proximity_radius_m: 60.0,
            filter_offload_threshold: 5_000,
            command_buffer: 256,
        }
    }
}

impl EngineConfig {
    pub fn geocode_stagger(&self) -> Duration {
        Duration::from_millis(self.geocode_stagger_ms)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.viewport_buffer_factor.is_finite() && self.viewport_buffer_factor > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "viewport_buffer_factor must be positive, got {}",
                self.viewport_buffer_factor
            )));
        }
        if !(self.proximity_radius_m.is_finite() && self.proximity_radius_m >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "proximity_radius_m must be non-negative, got {}",
                self.proximity_radius_m
            )));
        }
        if self.command_buffer == 0 {
            return Err(EngineError::InvalidConfig(
                "command_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
