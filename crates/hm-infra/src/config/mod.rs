mod geocoder_config;

pub use geocoder_config::GeocoderConfig;
