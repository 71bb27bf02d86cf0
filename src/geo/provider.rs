//! The geocoding seam used by the API handlers.

use std::future::Future;

use thiserror::Error;

use crate::geo::types::Address;

/// Errors that can occur during a geo lookup.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Latitude or longitude is not a finite number.
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(String),

    /// Transport failure talking to the provider.
    #[error("geo provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("geo provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("invalid geo provider url: {0}")]
    Url(#[from] url::ParseError),
}

/// Address search and reverse geocoding.
pub trait GeoProvider: Send + Sync + 'static {
    /// Free-text address search.
    fn address_search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Address>, GeoError>> + Send;

    /// Addresses near a coordinate pair.
    fn geocode(
        &self,
        lat: &str,
        lon: &str,
    ) -> impl Future<Output = Result<Vec<Address>, GeoError>> + Send;
}

/// Parse a coordinate the way the provider expects it: a finite JSON number.
pub fn parse_coordinate(raw: &str) -> Result<f64, GeoError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeoError::InvalidCoordinate(raw.to_string()))
}
