//! Reverse-geocoding provider client.
//!
//! Turns a coordinate into a display name for the dashboard header. Location
//! naming is best-effort everywhere it is used: callers fall back to
//! [`LocationInfo::fallback`] on any failure here, so this client never
//! decides an endpoint's fate.

use serde::{Deserialize, Serialize};

use super::{UpstreamError, get_json};
use crate::model::LocationInfo;

/// Base URL for the geocoding API.
const GEOCODING_API_BASE: &str = "https://api.opencagedata.com/geocode/v1";

/// Provider label used in errors.
const PROVIDER: &str = "geocoding";

/// Client for reverse geocoding coordinates into place names.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeocodingClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GEOCODING_API_BASE.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Resolve a coordinate into a location name.
    ///
    /// Errors when the provider is unreachable or returns no result for the
    /// coordinate; callers are expected to fall back rather than propagate.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<LocationInfo, UpstreamError> {
        let url = format!(
            "{}/json?q={}+{}&key={}&limit=1&no_annotations=1",
            self.base_url, lat, lon, self.api_key
        );

        let response: GeocodeResponse = get_json(&self.client, PROVIDER, &url).await?;
        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::new(PROVIDER, "no results for coordinate"))?;

        Ok(location_from_components(result.components))
    }
}

/// Map the provider's address components onto a [`LocationInfo`].
///
/// Prefers the village-level name and appends the nearest major city, so a
/// rural farm reads as "Somarasampettai, Tiruchirappalli, Tamil Nadu" rather
/// than just the district seat.
fn location_from_components(components: GeocodeComponents) -> LocationInfo {
    let village = components
        .village
        .or(components.hamlet)
        .unwrap_or_default();
    let major_city = components
        .city
        .or(components.town)
        .or(components.county)
        .unwrap_or_else(|| "Current Location".to_string());
    let state = components.state.unwrap_or_default();
    let country = components.country.unwrap_or_else(|| "India".to_string());

    let state_suffix = if state.is_empty() {
        String::new()
    } else {
        format!(", {state}")
    };
    let full_name = if village.is_empty() {
        format!("{major_city}{state_suffix}")
    } else {
        format!("{village}, {major_city}{state_suffix}")
    };

    LocationInfo {
        name: if village.is_empty() {
            major_city
        } else {
            village
        },
        state,
        country,
        full_name,
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Reverse-geocode response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

/// One geocoding match.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    components: GeocodeComponents,
}

/// Address components of a geocoding match. All optional; which ones are
/// present depends on how rural the coordinate is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeocodeComponents {
    #[serde(default)]
    village: Option<String>,

    #[serde(default)]
    hamlet: Option<String>,

    #[serde(default)]
    city: Option<String>,

    #[serde(default)]
    town: Option<String>,

    #[serde(default)]
    county: Option<String>,

    #[serde(default)]
    state: Option<String>,

    #[serde(default)]
    country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_village_with_major_city() {
        let components = GeocodeComponents {
            village: Some("Somarasampettai".to_string()),
            city: Some("Tiruchirappalli".to_string()),
            state: Some("Tamil Nadu".to_string()),
            country: Some("India".to_string()),
            ..Default::default()
        };

        let info = location_from_components(components);

        assert_eq!(info.name, "Somarasampettai");
        assert_eq!(info.full_name, "Somarasampettai, Tiruchirappalli, Tamil Nadu");
        assert_eq!(info.country, "India");
    }

    #[test]
    fn test_city_only() {
        let components = GeocodeComponents {
            town: Some("Thanjavur".to_string()),
            state: Some("Tamil Nadu".to_string()),
            ..Default::default()
        };

        let info = location_from_components(components);

        assert_eq!(info.name, "Thanjavur");
        assert_eq!(info.full_name, "Thanjavur, Tamil Nadu");
        assert_eq!(info.country, "India");
    }

    #[test]
    fn test_empty_components_fall_back() {
        let info = location_from_components(GeocodeComponents::default());

        assert_eq!(info.name, "Current Location");
        assert_eq!(info.full_name, "Current Location");
        assert_eq!(info.state, "");
    }
}
