//! Sunrise/sunset provider client.
//!
//! Keyless public API returning sun times for a coordinate. Used alongside
//! the agro-monitoring weather call, whose payload carries no sun times of
//! its own.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::{UpstreamError, get_json};

/// Base URL for the sunrise-sunset API.
const SUNRISE_API_BASE: &str = "https://api.sunrise-sunset.org";

/// Provider label used in errors.
const PROVIDER: &str = "sunrise-sunset";

/// Sunrise and sunset as Unix timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Client for the sunrise-sunset API.
#[derive(Clone)]
pub struct SunriseClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SunriseClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SunriseClient {
    /// Create a new client. The API requires no key.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: SUNRISE_API_BASE.to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch today's sun times for a coordinate.
    pub async fn sun_times(&self, lat: f64, lon: f64) -> Result<SunTimes, UpstreamError> {
        // formatted=0 switches the API from human-readable clock strings to
        // ISO 8601, which is the only machine-parseable mode.
        let url = format!(
            "{}/json?lat={}&lng={}&formatted=0",
            self.base_url, lat, lon
        );

        let response: SunriseResponse = get_json(&self.client, PROVIDER, &url).await?;
        if response.status != "OK" {
            return Err(UpstreamError::new(
                PROVIDER,
                format!("provider status {}", response.status),
            ));
        }

        Ok(SunTimes {
            sunrise: parse_sun_timestamp(&response.results.sunrise)?,
            sunset: parse_sun_timestamp(&response.results.sunset)?,
        })
    }
}

fn parse_sun_timestamp(value: &str) -> Result<i64, UpstreamError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| UpstreamError::new(PROVIDER, format!("bad timestamp {value:?}: {e}")))
}

// ============================================================================
// Response types
// ============================================================================

/// Sunrise-sunset response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SunriseResponse {
    #[serde(default)]
    results: SunriseResults,

    #[serde(default)]
    status: String,
}

/// ISO 8601 sun times.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SunriseResults {
    #[serde(default)]
    sunrise: String,

    #[serde(default)]
    sunset: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sun_timestamp() {
        assert_eq!(
            parse_sun_timestamp("2015-05-21T05:05:35+00:00").unwrap(),
            1432184735
        );
    }

    #[test]
    fn test_parse_sun_timestamp_rejects_clock_strings() {
        // What the API returns without formatted=0.
        assert!(parse_sun_timestamp("7:27:02 AM").is_err());
    }
}
