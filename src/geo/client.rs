//! DaData suggestions API client.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GeoConfig;
use crate::geo::provider::{parse_coordinate, GeoError, GeoProvider};
use crate::geo::types::Address;

const SUGGEST_ADDRESS: &str = "suggest/address";
const GEOLOCATE_ADDRESS: &str = "geolocate/address";

/// `{"suggestions": [...]}` envelope shared by both endpoints.
#[derive(Debug, Default, Deserialize)]
struct Suggestions {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Default, Deserialize)]
struct Suggestion {
    #[serde(default)]
    data: SuggestionData,
}

/// Only the fields we map; the provider sends `null` for unknown parts.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestionData {
    city: Option<String>,
    street: Option<String>,
    house: Option<String>,
    geo_lat: Option<String>,
    geo_lon: Option<String>,
}

impl From<SuggestionData> for Address {
    fn from(data: SuggestionData) -> Self {
        Address {
            city: data.city.unwrap_or_default(),
            street: data.street.unwrap_or_default(),
            house: data.house.unwrap_or_default(),
            latitude: data.geo_lat.unwrap_or_default(),
            longitude: data.geo_lon.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct SuggestQuery<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct GeolocateQuery {
    lat: f64,
    lon: f64,
}

/// Search results without a city or street are not useful addresses.
fn search_results(response: Suggestions) -> Vec<Address> {
    response
        .suggestions
        .into_iter()
        .map(|s| Address::from(s.data))
        .filter(|a| !a.city.is_empty() && !a.street.is_empty())
        .collect()
}

fn geocode_results(response: Suggestions) -> Vec<Address> {
    response
        .suggestions
        .into_iter()
        .map(|s| Address::from(s.data))
        .collect()
}

/// Client for the DaData suggestions API.
#[derive(Debug, Clone)]
pub struct DadataClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    secret_key: String,
}

impl DadataClient {
    pub fn new(config: &GeoConfig) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn post<T: Serialize>(&self, endpoint: &str, payload: &T) -> Result<Suggestions, GeoError> {
        let url = self.base_url.join(endpoint)?;

        let mut request = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(ACCEPT, "application/json")
            .json(payload);
        if !self.secret_key.is_empty() {
            request = request.header("X-Secret", &self.secret_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = %status, "Geo provider rejected request");
            return Err(GeoError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

impl GeoProvider for DadataClient {
    async fn address_search(&self, query: &str) -> Result<Vec<Address>, GeoError> {
        let response = self.post(SUGGEST_ADDRESS, &SuggestQuery { query }).await?;
        Ok(search_results(response))
    }

    async fn geocode(&self, lat: &str, lon: &str) -> Result<Vec<Address>, GeoError> {
        let payload = GeolocateQuery {
            lat: parse_coordinate(lat)?,
            lon: parse_coordinate(lon)?,
        };
        let response = self.post(GEOLOCATE_ADDRESS, &payload).await?;
        Ok(geocode_results(response))
    }
}
