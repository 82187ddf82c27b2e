//! Reverse geocoding against a Nominatim server.

use super::retry::RetryPolicy;
use super::GeoPoint;
use crate::error::GeocodeError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Public OpenStreetMap reverse geocoding endpoint
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// Settings for the geocoding client
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Reverse lookup URL, without a query string
    pub endpoint: String,
    /// Identifies this application to the service
    pub user_agent: String,
    /// Sent as the `Referer` header
    pub referer: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Courtesy delay, backoff and attempt ceiling
    pub retry: RetryPolicy,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: format!("PhotoOrganizer/{}", env!("CARGO_PKG_VERSION")),
            referer: "https://github.com/cassiocmps/Photo-Organizer".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Body of a reverse lookup response; only the address matters here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub address: Option<Address>,
}

/// Address details returned with `addressdetails=1`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
}

impl Address {
    /// First non-empty of city, town, village, municipality, county
    pub fn place_name(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.municipality,
            &self.county,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .map(str::trim)
        .find(|name| !name.is_empty())
    }
}

impl ReverseResponse {
    pub fn place_name(&self) -> Option<&str> {
        self.address.as_ref().and_then(Address::place_name)
    }
}

/// A single reverse lookup, without retries
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, point: GeoPoint) -> Result<ReverseResponse, GeocodeError>;
}

/// Blocking HTTP client for a Nominatim `/reverse` endpoint
pub struct NominatimClient {
    client: Client,
    endpoint: String,
}

impl NominatimClient {
    /// Build a client that identifies itself per the service's usage policy
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&config.referer)
            .map_err(|e| GeocodeError::ClientBuild(e.to_string()))?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeocodeError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('?').to_string(),
        })
    }

    /// Lookup URL for a point, coordinates to six decimal places
    pub fn request_url(&self, point: GeoPoint) -> String {
        format!(
            "{}?lat={:.6}&lon={:.6}&format=json&addressdetails=1",
            self.endpoint, point.latitude, point.longitude
        )
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, point: GeoPoint) -> Result<ReverseResponse, GeocodeError> {
        let url = self.request_url(point);
        debug!("Reverse geocoding {}", url);

        let response = self.client.get(&url).send()?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ReverseResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn city_wins_over_smaller_places() {
        let response = parse(
            r#"{"address": {"village": "Belém", "city": "Lisboa", "county": "Lisboa District"}}"#,
        );
        assert_eq!(response.place_name(), Some("Lisboa"));
    }

    #[test]
    fn falls_through_to_county() {
        let response = parse(r#"{"address": {"county": "Kerry", "country": "Ireland"}}"#);
        assert_eq!(response.place_name(), Some("Kerry"));
    }

    #[test]
    fn empty_fields_are_skipped() {
        let response = parse(r#"{"address": {"city": "", "town": "  ", "village": "Óbidos"}}"#);
        assert_eq!(response.place_name(), Some("Óbidos"));
    }

    #[test]
    fn missing_address_has_no_name() {
        assert_eq!(parse(r#"{"error": "Unable to geocode"}"#).place_name(), None);
        assert_eq!(parse(r#"{"address": {"country": "Antarctica"}}"#).place_name(), None);
    }

    #[test]
    fn request_url_uses_six_decimals() {
        let client = NominatimClient::new(&GeocodeConfig::default()).unwrap();
        let url = client.request_url(GeoPoint::new(38.7, -9.123456789));

        assert_eq!(
            url,
            "https://nominatim.openstreetmap.org/reverse?lat=38.700000&lon=-9.123457&format=json&addressdetails=1"
        );
    }

    #[test]
    fn user_agent_names_the_application() {
        let config = GeocodeConfig::default();
        assert!(config.user_agent.starts_with("PhotoOrganizer/"));
        assert_eq!(config.retry.max_attempts, 3);
    }
}
