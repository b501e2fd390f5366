use thiserror::Error;

use crate::geo::Coordinate;

/// Geocoding errors.
///
/// 地理编码错误类型。调用方将所有变体视为"本会话内无法解析"。
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The service answered but knows no place for the address.
    #[error("address not found: {0}")]
    NotFound(String),

    /// The call did not complete in time.
    #[error("geocoding timed out")]
    Timeout,

    /// Transport failure talking to the service.
    #[error("geocoding network error: {0}")]
    Network(String),

    /// The service answered with something unusable.
    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

/// Free-text address resolution.
#[async_trait::async_trait]
pub trait GeocoderPort: Send + Sync {
    /// Resolve `address` (e.g. `"Austin, Travis, TX"`) to a coordinate.
    async fn resolve_address(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

#[cfg(test)]
mockall::mock! {
    pub Geocoder {}

    #[async_trait::async_trait]
    impl GeocoderPort for Geocoder {
        async fn resolve_address(&self, address: &str) -> Result<Coordinate, GeocodeError>;
    }
}
