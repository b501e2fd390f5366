//! Host wiring: configuration loading and tracing setup.

pub mod config;
pub mod tracing;

pub use config::{load_config, HostConfig};
pub use self::tracing::init_tracing_subscriber;
