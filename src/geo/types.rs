//! Address records and the JSON bodies of the geo endpoints.

use serde::{Deserialize, Serialize};

/// A resolved address. Coordinates stay strings, as the provider sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub house: String,
    #[serde(rename = "lat")]
    pub latitude: String,
    #[serde(rename = "lon")]
    pub longitude: String,
}

/// Body of `POST /api/address/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub addresses: Vec<Address>,
}

/// Body of `POST /api/address/geocode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeRequest {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lng: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub addresses: Vec<Address>,
}
