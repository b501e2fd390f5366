//! # Configuration Loader / 配置加载器
//!
//! Reads the host TOML file into [`HostConfig`]. Missing sections and fields
//! fall back to their defaults; range checks belong to
//! [`EngineConfig::validate`], which runs when the engine is spawned.
//!
//! ```toml
//! [engine]
//! geocode_batch_size = 50
//! proximity_radius_m = 60.0
//!
//! [geocoder]
//! base_url = "https://nominatim.openstreetmap.org"
//! ```

use std::path::Path;

use anyhow::Context;
use hm_core::EngineConfig;
use hm_infra::GeocoderConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub engine: EngineConfig,
    pub geocoder: GeocoderConfig,
}

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML for
/// [`HostConfig`].
pub fn load_config(config_path: &Path) -> anyhow::Result<HostConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content).context("Failed to parse config as TOML")
}
