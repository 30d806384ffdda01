//! Lookups against the ipinfo.io JSON API.

use crate::credentials::Credentials;
use crate::error::GeoError;
use crate::GeoLocator;
use geotrace_model::LocationResult;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ipinfo.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body of `GET /<address>/json`. Bogon and private addresses
/// come back with none of these set.
#[derive(Debug, Deserialize)]
pub struct IpInfoResponse {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub loc: Option<String>,
    pub org: Option<String>,
}

impl From<IpInfoResponse> for LocationResult {
    fn from(resp: IpInfoResponse) -> Self {
        LocationResult {
            country: non_empty(resp.country),
            region: non_empty(resp.region),
            city: non_empty(resp.city),
            org: non_empty(resp.org),
            coordinate: non_empty(resp.loc),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct IpInfoLocator {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl IpInfoLocator {
    pub fn new(credentials: Credentials) -> Result<Self, GeoError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(GeoError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn lookup_url(&self, address: &str) -> String {
        format!("{}/{}/json", self.base_url, address)
    }

    /// Fallible lookup; `locate` is the non-failing wrapper.
    pub fn fetch(&self, address: &str) -> Result<LocationResult, GeoError> {
        let url = self.lookup_url(address);
        debug!("geolocation request: {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.credentials.token())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::BadStatus(status.as_u16()));
        }

        let body = response.text()?;
        parse_response(&body)
    }
}

pub fn parse_response(body: &str) -> Result<LocationResult, GeoError> {
    let resp: IpInfoResponse =
        serde_json::from_str(body).map_err(|err| GeoError::InvalidResponse(err.to_string()))?;
    Ok(resp.into())
}

impl GeoLocator for IpInfoLocator {
    fn locate(&self, address: &str) -> LocationResult {
        match self.fetch(address) {
            Ok(location) => location,
            Err(err) => {
                warn!("geolocation failed for {address}: {err}");
                LocationResult::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_response() {
        let body = r#"{
            "ip": "8.8.8.8",
            "hostname": "dns.google",
            "city": "Mountain View",
            "region": "California",
            "country": "US",
            "loc": "37.4056,-122.0775",
            "org": "AS15169 Google LLC",
            "postal": "94043",
            "timezone": "America/Los_Angeles"
        }"#;
        let location = parse_response(body).unwrap();
        assert_eq!(location.city.as_deref(), Some("Mountain View"));
        assert_eq!(location.coordinate.as_deref(), Some("37.4056,-122.0775"));
        assert_eq!(location.org.as_deref(), Some("AS15169 Google LLC"));
    }

    #[test]
    fn bogon_response_is_all_missing() {
        let body = r#"{"ip": "192.168.1.1", "bogon": true}"#;
        let location = parse_response(body).unwrap();
        assert!(location.is_unavailable());
    }

    #[test]
    fn empty_fields_count_as_missing() {
        let body = r#"{"country": "", "city": "  ", "loc": "1.0,2.0"}"#;
        let location = parse_response(body).unwrap();
        assert!(location.country.is_none());
        assert!(location.city.is_none());
        assert_eq!(location.coordinate.as_deref(), Some("1.0,2.0"));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        assert!(matches!(
            parse_response("<html>rate limited</html>"),
            Err(GeoError::InvalidResponse(_))
        ));
    }

    #[test]
    fn unreachable_service_degrades_to_placeholder() {
        let locator =
            IpInfoLocator::with_base_url(Credentials::new("t"), "http://127.0.0.1:9/").unwrap();
        assert_eq!(locator.lookup_url("8.8.8.8"), "http://127.0.0.1:9/8.8.8.8/json");
        assert!(locator.locate("8.8.8.8").is_unavailable());
    }
}
