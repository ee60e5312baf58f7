//! Agro-monitoring provider client.
//!
//! The agronomic provider is the system of record for farm polygons and the
//! source of soil conditions, satellite NDVI history, and in-field weather.
//! Polygon identity is assigned by the provider on creation; nothing is
//! stored locally.
//!
//! # Units
//!
//! Every temperature this provider reports is in Kelvin, including soil
//! temperatures. Conversion happens in the normalizer, not here.

use serde::{Deserialize, Serialize};

use super::{UpstreamError, get_json, post_json};

/// Base URL for the agro-monitoring API.
const AGRO_API_BASE: &str = "http://api.agromonitoring.com/agro/1.0";

/// Provider label used in errors.
const PROVIDER: &str = "agromonitoring";

/// Client for the agro-monitoring polygon/soil/NDVI/weather API.
#[derive(Clone)]
pub struct AgroMonitoringClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AgroMonitoringClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: AGRO_API_BASE.to_string(),
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

    /// Fetch current weather for a coordinate. Temperatures are Kelvin.
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<AgroWeather, UpstreamError> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}",
            self.base_url, lat, lon, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }

    /// Register a new farm polygon and return the provider's record for it,
    /// including the assigned id.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name for the farm
    /// * `geo_json` - GeoJSON `Feature` with a closed `Polygon` ring
    pub async fn create_polygon(
        &self,
        name: &str,
        geo_json: &serde_json::Value,
    ) -> Result<AgroPolygon, UpstreamError> {
        let url = format!("{}/polygons?appid={}", self.base_url, self.api_key);
        let body = serde_json::json!({ "name": name, "geo_json": geo_json });

        post_json(&self.client, PROVIDER, &url, &body).await
    }

    /// List every polygon registered under this API key.
    pub async fn list_polygons(&self) -> Result<Vec<AgroPolygon>, UpstreamError> {
        let url = format!("{}/polygons?appid={}", self.base_url, self.api_key);

        get_json(&self.client, PROVIDER, &url).await
    }

    /// Fetch a single polygon by its provider-assigned id.
    pub async fn polygon(&self, polygon_id: &str) -> Result<AgroPolygon, UpstreamError> {
        let url = format!(
            "{}/polygons/{}?appid={}",
            self.base_url, polygon_id, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }

    /// Fetch the latest soil reading for a polygon. Temperatures are Kelvin.
    pub async fn soil(&self, polygon_id: &str) -> Result<AgroSoil, UpstreamError> {
        let url = format!(
            "{}/soil?polyid={}&appid={}",
            self.base_url, polygon_id, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }

    /// Fetch satellite NDVI history for a polygon over a Unix-second range,
    /// time ascending.
    pub async fn ndvi_history(
        &self,
        polygon_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<AgroNdviEntry>, UpstreamError> {
        let url = format!(
            "{}/ndvi/history?polyid={}&start={}&end={}&appid={}",
            self.base_url, polygon_id, start, end, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }
}

// ============================================================================
// Response types
// ============================================================================

/// A farm polygon as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgroPolygon {
    /// Provider-assigned polygon id.
    #[serde(default)]
    pub id: String,

    /// Farm name given at creation time.
    #[serde(default)]
    pub name: String,

    /// The GeoJSON boundary echoed back by the provider.
    #[serde(default)]
    pub geo_json: Option<serde_json::Value>,

    /// Polygon area in square meters.
    #[serde(default)]
    pub area: Option<f64>,

    /// Centroid as `[lon, lat]`.
    #[serde(default)]
    pub center: Option<Vec<f64>>,

    /// Unix timestamp of polygon creation.
    #[serde(default)]
    pub created_at: Option<i64>,

    /// Owning account id, when reported.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AgroPolygon {
    /// Centroid as `(lat, lon)`, if the provider supplied one.
    pub fn center_lat_lon(&self) -> Option<(f64, f64)> {
        match self.center.as_deref() {
            Some([lon, lat, ..]) => Some((*lat, *lon)),
            _ => None,
        }
    }
}

/// Current-weather reading at a coordinate, Kelvin temperatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroWeather {
    /// Unix timestamp of the reading.
    #[serde(default)]
    pub dt: Option<i64>,

    /// Temperature/humidity/pressure block.
    #[serde(default)]
    pub main: AgroMain,

    /// Wind reading.
    #[serde(default)]
    pub wind: AgroWind,

    /// Cloud cover reading.
    #[serde(default)]
    pub clouds: AgroClouds,

    /// Precipitation volumes, when raining.
    #[serde(default)]
    pub rain: Option<AgroRain>,

    /// Weather conditions; usually a single entry.
    #[serde(default)]
    pub weather: Vec<AgroCondition>,
}

impl AgroWeather {
    /// The primary weather condition, when one was reported.
    pub fn condition(&self) -> Option<&AgroCondition> {
        self.weather.first()
    }
}

/// Main readings block. Temperatures are Kelvin and may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroMain {
    #[serde(default)]
    pub temp: Option<f64>,

    #[serde(default)]
    pub feels_like: Option<f64>,

    #[serde(default)]
    pub temp_min: Option<f64>,

    #[serde(default)]
    pub temp_max: Option<f64>,

    /// Relative humidity in percent.
    #[serde(default)]
    pub humidity: i64,

    /// Pressure in hPa.
    #[serde(default)]
    pub pressure: i64,
}

/// Wind reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroWind {
    /// Speed in m/s.
    #[serde(default)]
    pub speed: f64,

    /// Direction in meteorological degrees.
    #[serde(default)]
    pub deg: f64,
}

/// Cloud cover reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroClouds {
    /// Cloudiness in percent.
    #[serde(default)]
    pub all: i64,
}

/// Precipitation volumes in mm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroRain {
    #[serde(default, rename = "1h")]
    pub one_hour: Option<f64>,

    #[serde(default, rename = "3h")]
    pub three_hour: Option<f64>,
}

/// A single weather condition entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroCondition {
    /// Provider weather-condition code.
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub main: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,
}

/// Latest soil reading for a polygon. Temperatures are Kelvin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroSoil {
    /// Unix timestamp of the reading.
    #[serde(default)]
    pub dt: i64,

    /// Surface temperature.
    #[serde(default)]
    pub t0: Option<f64>,

    /// Temperature at 10 cm depth.
    #[serde(default)]
    pub t10: Option<f64>,

    /// Volumetric soil moisture in m³/m³.
    #[serde(default)]
    pub moisture: Option<f64>,
}

/// One NDVI observation from satellite imagery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroNdviEntry {
    /// Unix timestamp of the observation.
    #[serde(default)]
    pub dt: i64,

    /// NDVI statistics over the polygon.
    #[serde(default)]
    pub data: AgroNdviStats,

    /// Cloud coverage in percent.
    #[serde(default)]
    pub cl: f64,
}

/// NDVI statistics over a polygon's pixels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgroNdviStats {
    #[serde(default)]
    pub min: f64,

    #[serde(default)]
    pub max: f64,

    #[serde(default)]
    pub mean: f64,

    #[serde(default)]
    pub std: f64,

    /// Number of pixels the statistics were computed over.
    #[serde(default)]
    pub num: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_center_lat_lon() {
        let polygon = AgroPolygon {
            id: "5abb9fb82c8897000bde3e87".to_string(),
            name: "Test farm".to_string(),
            geo_json: None,
            area: Some(190.1),
            center: Some(vec![78.7047, 10.7905]),
            created_at: None,
            user_id: None,
        };

        assert_eq!(polygon.center_lat_lon(), Some((10.7905, 78.7047)));
    }

    #[test]
    fn test_polygon_center_missing() {
        let raw = r#"{"id": "abc", "name": "No center"}"#;
        let polygon: AgroPolygon = serde_json::from_str(raw).unwrap();

        assert_eq!(polygon.center_lat_lon(), None);
        assert_eq!(polygon.area, None);
    }

    #[test]
    fn test_soil_parses_partial_payload() {
        let raw = r#"{"dt": 1522108800, "t10": 281.96, "moisture": 0.175}"#;
        let soil: AgroSoil = serde_json::from_str(raw).unwrap();

        assert_eq!(soil.dt, 1522108800);
        assert_eq!(soil.t0, None);
        assert_eq!(soil.t10, Some(281.96));
        assert_eq!(soil.moisture, Some(0.175));
    }

    #[test]
    fn test_ndvi_entry_defaults() {
        let raw = r#"{"dt": 1530316800, "data": {"mean": 0.53}}"#;
        let entry: AgroNdviEntry = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.dt, 1530316800);
        assert_eq!(entry.data.mean, 0.53);
        assert_eq!(entry.data.min, 0.0);
        assert_eq!(entry.data.num, 0);
        assert_eq!(entry.cl, 0.0);
    }

    #[test]
    fn test_weather_condition_helper() {
        let raw = r#"{
            "dt": 1485789600,
            "weather": [{"id": 741, "main": "Fog", "description": "fog"}],
            "main": {"temp": 300.15, "humidity": 87, "pressure": 1007}
        }"#;
        let weather: AgroWeather = serde_json::from_str(raw).unwrap();

        assert_eq!(weather.condition().and_then(|c| c.id), Some(741));
        assert_eq!(weather.main.temp, Some(300.15));
        assert_eq!(weather.main.humidity, 87);
    }
}
