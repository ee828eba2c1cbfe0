//! Geo-IP lookup collaborator

use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default deadline for one lookup
pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_millis(1500);

/// Raw answer of the geo-IP service (`GET /<ip>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoIpResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Geo-IP lookup trait
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip_address: &str) -> Result<GeoIpResponse>;
}

/// Geo-IP lookup over HTTP
pub struct HttpGeoLookup {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGeoLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RuntimeError::ExternalCallFailed(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip_address: &str) -> Result<GeoIpResponse> {
        let url = format!("{}/{}", self.base_url, ip_address);
        tracing::debug!("Calling geo-ip lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RuntimeError::ExternalCallFailed(format!("geo lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RuntimeError::ExternalCallFailed(format!(
                "geo lookup failed with status: {}",
                response.status()
            )));
        }

        response.json::<GeoIpResponse>().await.map_err(|e| {
            RuntimeError::ExternalCallFailed(format!("Failed to parse geo response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_http_lookup_parses_response() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/8.8.8.8")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "latitude": 37.386, "longitude": -122.0838, "country": "United States", "city": "Mountain View"}"#,
            )
            .create_async()
            .await;

        let lookup = HttpGeoLookup::new(server.url(), DEFAULT_GEO_TIMEOUT).unwrap();
        let response = lookup.lookup("8.8.8.8").await.unwrap();
        assert_eq!(response.success, Some(true));
        assert_eq!(response.city.as_deref(), Some("Mountain View"));
    }

    #[tokio::test]
    async fn test_http_lookup_error_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/8.8.4.4")
            .with_status(503)
            .create_async()
            .await;

        let lookup = HttpGeoLookup::new(server.url(), DEFAULT_GEO_TIMEOUT).unwrap();
        let err = lookup.lookup("8.8.4.4").await.unwrap_err();
        assert!(matches!(err, RuntimeError::ExternalCallFailed(_)));
    }
}
