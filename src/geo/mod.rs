//! Geocoding API served by the local handler chain.
//!
//! # Routes
//! - `POST /api/address/search`  → [`GeoProvider::address_search`]
//! - `POST /api/address/geocode` → [`GeoProvider::geocode`]
//! - `GET  /api`, `GET /api/*`   → plain-text greeting

pub mod client;
pub mod handlers;
pub mod provider;
pub mod types;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

pub use client::DadataClient;
pub use provider::{GeoError, GeoProvider};
pub use types::{Address, GeocodeRequest, GeocodeResponse, SearchRequest, SearchResponse};

use self::handlers::*;

pub fn setup_geo_router<P: GeoProvider>(provider: Arc<P>) -> Router {
    Router::new()
        .route("/api/address/search", post(address_search::<P>))
        .route("/api/address/geocode", post(address_geocode::<P>))
        .route("/api", get(api_root))
        // Catch-alls never match an empty tail, so "/api/" needs its own route.
        .route("/api/", get(api_root))
        .route("/api/{*rest}", get(api_root))
        .with_state(provider)
}
