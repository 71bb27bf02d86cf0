use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::geo::provider::{GeoError, GeoProvider};
use crate::geo::types::{GeocodeRequest, GeocodeResponse, SearchRequest, SearchResponse};

const EMPTY_QUERY: &str = "Empty Query";

impl IntoResponse for GeoError {
    fn into_response(self) -> Response {
        let status = match self {
            GeoError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub async fn address_search<P: GeoProvider>(
    State(provider): State<Arc<P>>,
    body: Bytes,
) -> Response {
    let request = match serde_json::from_slice::<SearchRequest>(&body) {
        Ok(r) if !r.query.is_empty() => r,
        _ => return (StatusCode::BAD_REQUEST, EMPTY_QUERY).into_response(),
    };

    match provider.address_search(&request.query).await {
        Ok(addresses) => Json(SearchResponse { addresses }).into_response(),
        Err(e) => {
            tracing::error!(query = %request.query, error = %e, "Address search failed");
            e.into_response()
        }
    }
}

pub async fn address_geocode<P: GeoProvider>(
    State(provider): State<Arc<P>>,
    body: Bytes,
) -> Response {
    let request = match serde_json::from_slice::<GeocodeRequest>(&body) {
        Ok(r) if !r.lat.is_empty() && !r.lng.is_empty() => r,
        _ => return (StatusCode::BAD_REQUEST, EMPTY_QUERY).into_response(),
    };

    match provider.geocode(&request.lat, &request.lng).await {
        Ok(addresses) => Json(GeocodeResponse { addresses }).into_response(),
        Err(e) => {
            tracing::error!(lat = %request.lat, lng = %request.lng, error = %e, "Geocode failed");
            e.into_response()
        }
    }
}

pub async fn api_root() -> &'static str {
    "Hello from API"
}
