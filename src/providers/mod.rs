//! Upstream provider clients.
//!
//! Each provider gets a thin client over a shared [`reqwest::Client`]:
//!
//! - [`agromonitoring`]: polygons, soil, NDVI history, and Kelvin weather
//! - [`openweather`]: metric current weather and 3-hour forecasts
//! - [`geocoding`]: reverse geocoding of coordinates into place names
//! - [`sunrise`]: sunrise/sunset times for a coordinate
//!
//! Clients parse responses into explicit optional-field structs at the
//! boundary; raw provider JSON never reaches the contract types. There are
//! no retries — a failed call fails the request it belongs to.

pub mod agromonitoring;
pub mod geocoding;
pub mod openweather;
pub mod sunrise;

pub use agromonitoring::AgroMonitoringClient;
pub use geocoding::GeocodingClient;
pub use openweather::OpenWeatherClient;
pub use sunrise::SunriseClient;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A failed call to a third-party provider.
///
/// `body` captures the upstream JSON payload when a non-success status
/// carried one, so the HTTP boundary can attach it as error details.
#[derive(Debug, Clone, Error)]
#[error("{provider}: {message}")]
pub struct UpstreamError {
    /// Provider label (e.g. "agromonitoring").
    pub provider: &'static str,

    /// HTTP status returned by the provider, when one was received.
    pub status: Option<u16>,

    /// Human-readable failure description.
    pub message: String,

    /// Upstream error payload, when the provider returned JSON.
    pub body: Option<serde_json::Value>,
}

impl UpstreamError {
    /// Build an error with no HTTP status (transport, parse, or contract
    /// violations detected locally).
    pub fn new(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: None,
            message: message.into(),
            body: None,
        }
    }

    fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        Self {
            provider,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            body: None,
        }
    }

    /// The value to surface as `details` in the error envelope: the
    /// captured upstream payload if there was one, otherwise the message.
    pub fn details(&self) -> serde_json::Value {
        self.body
            .clone()
            .unwrap_or_else(|| serde_json::Value::String(self.to_string()))
    }
}

/// GET a URL and decode the JSON response body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
) -> Result<T, UpstreamError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| UpstreamError::transport(provider, e))?;

    decode_json(provider, response).await
}

/// POST a JSON body to a URL and decode the JSON response body.
pub(crate) async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
    body: &B,
) -> Result<T, UpstreamError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| UpstreamError::transport(provider, e))?;

    decode_json(provider, response).await
}

async fn decode_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| UpstreamError::transport(provider, e))?;

    if !status.is_success() {
        return Err(UpstreamError {
            provider,
            status: Some(status.as_u16()),
            message: format!("unexpected status {status}"),
            body: serde_json::from_str(&text).ok(),
        });
    }

    serde_json::from_str(&text).map_err(|e| UpstreamError {
        provider,
        status: Some(status.as_u16()),
        message: format!("invalid JSON payload: {e}"),
        body: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_prefers_body() {
        let err = UpstreamError {
            provider: "agromonitoring",
            status: Some(404),
            message: "unexpected status 404 Not Found".to_string(),
            body: Some(serde_json::json!({"error": "polygon not found"})),
        };

        assert_eq!(
            err.details(),
            serde_json::json!({"error": "polygon not found"})
        );
    }

    #[test]
    fn test_details_falls_back_to_message() {
        let err = UpstreamError::new("sunrise-sunset", "connection refused");

        assert_eq!(
            err.details(),
            serde_json::Value::String("sunrise-sunset: connection refused".to_string())
        );
    }
}
