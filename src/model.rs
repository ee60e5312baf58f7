//! Contract types for the dashboard API.
//!
//! These are the shapes the frontend consumes. They are produced exclusively
//! by the normalizer ([`crate::normalize`]) and the dashboard aggregator
//! ([`crate::dashboard`]) from the providers' optional-field structs;
//! missing provider data has already been defaulted by the time a value of
//! one of these types exists.
//!
//! Temperatures are integer Celsius throughout. `fullName` keys keep the
//! camelCase spelling the frontend expects.

use serde::{Deserialize, Serialize};

use crate::providers::agromonitoring::{AgroPolygon, AgroRain, AgroSoil};
use crate::providers::sunrise::SunTimes;

/// Default latitude when a request omits coordinates (Trichy, Tamil Nadu).
pub const DEFAULT_LAT: f64 = 10.7905;

/// Default longitude when a request omits coordinates.
pub const DEFAULT_LON: f64 = 78.7047;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A resolved place name for a coordinate.
///
/// Recomputed per request; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Village or city name.
    pub name: String,

    /// State or province, empty when unknown.
    pub state: String,

    /// Country name.
    pub country: String,

    /// Display string combining village, city, and state.
    #[serde(rename = "fullName")]
    pub full_name: String,
}

impl LocationInfo {
    /// The value used whenever reverse geocoding fails or is not configured.
    pub fn fallback() -> Self {
        Self {
            name: "Current Location".to_string(),
            state: String::new(),
            country: "India".to_string(),
            full_name: "Current Location".to_string(),
        }
    }
}

// ============================================================================
// Query and request types
// ============================================================================

/// Optional coordinate query parameters; defaults apply when omitted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl CoordinateQuery {
    /// The requested coordinate, or the default location.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat.unwrap_or(DEFAULT_LAT),
            lon: self.lon.unwrap_or(DEFAULT_LON),
        }
    }
}

/// Unix-second range for NDVI history; defaults to the last 90 days.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NdviRangeQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Body for farm creation. Both fields are required; presence is validated
/// in the handler so the missing-field error matches the contract.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFarmRequest {
    #[serde(default)]
    pub name: Option<String>,

    /// GeoJSON `Feature` with a closed `Polygon` ring, forwarded verbatim
    /// to the polygon provider after coordinate range checks.
    #[serde(default)]
    pub geo_json: Option<serde_json::Value>,
}

// ============================================================================
// Weather contract
// ============================================================================

/// Normalized main readings, integer Celsius.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MainReadings {
    pub temp: i64,
    pub feels_like: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub humidity: i64,
    pub pressure: i64,
}

/// Wind reading passed through from the provider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
}

/// Cloud cover passed through from the provider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Clouds {
    pub all: i64,
}

/// A single normalized weather condition.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherCondition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Country, state, and sun times block of the weather response.
#[derive(Debug, Clone, Serialize)]
pub struct SysInfo {
    pub country: String,
    pub state: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Response body for `GET /api/weather`.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeatherResponse {
    pub name: String,

    #[serde(rename = "fullName")]
    pub full_name: String,

    pub coordinates: Coordinate,
    pub sys: SysInfo,
    pub main: MainReadings,
    pub wind: Wind,
    pub clouds: Clouds,
    pub weather: Vec<WeatherCondition>,
    pub dt: i64,
    pub timezone: String,
}

/// City block of the forecast response.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastCity {
    pub name: String,

    #[serde(rename = "fullName")]
    pub full_name: String,

    pub country: String,
    pub state: String,
    pub coordinates: Coordinate,
}

/// One normalized 3-hour forecast entry.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
    pub clouds: Clouds,

    /// Provider rain volume; `null` for dry slots.
    pub rain: Option<crate::providers::openweather::OwmRain>,

    pub dt_txt: String,
}

/// Response body for `GET /api/forecast`.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub city: ForecastCity,
    pub list: Vec<ForecastEntry>,
}

/// Response body for `GET /api/location`.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    #[serde(flatten)]
    pub location: LocationInfo,

    pub coordinates: Coordinate,
}

/// Kelvin-converted main block of the agro-data passthrough.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgroDataMain {
    pub temp: i64,
    pub humidity: i64,
    pub pressure: i64,
}

/// Response body for `GET /api/agro-data`.
#[derive(Debug, Clone, Serialize)]
pub struct AgroDataResponse {
    pub coordinates: Coordinate,
    pub main: AgroDataMain,
    pub wind: Wind,
    pub clouds: Clouds,
    pub rain: Option<AgroRain>,
    pub dt: i64,
}

// ============================================================================
// Farm contract
// ============================================================================

/// Response body for `POST /api/polygons`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateFarmResponse {
    pub success: bool,
    pub polygon: AgroPolygon,
    pub message: String,
}

/// One farm in the list response: the provider record plus derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct FarmSummary {
    #[serde(flatten)]
    pub polygon: AgroPolygon,

    /// Area formatted in hectares, `"N/A"` when the provider omits it.
    pub area_hectares: String,
}

/// Response body for `GET /api/polygons`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFarmsResponse {
    pub success: bool,
    pub polygons: Vec<FarmSummary>,
    pub count: usize,
}

/// Normalized soil conditions for a polygon.
#[derive(Debug, Clone, Serialize)]
pub struct SoilSnapshot {
    pub polygon_id: String,

    /// Unix timestamp of the reading.
    pub timestamp: i64,

    /// ISO rendering of `timestamp`.
    pub date: String,

    /// Surface temperature in Celsius, `null` when unreported.
    pub surface_temp: Option<i64>,

    /// Temperature at 10 cm depth in Celsius, `null` when unreported.
    pub soil_temp_10cm: Option<i64>,

    /// Volumetric soil moisture, `null` when unreported.
    pub moisture: Option<f64>,

    /// The provider reading the snapshot was derived from.
    pub raw_data: AgroSoil,
}

/// Response body for `GET /api/soil/:polygon_id`.
#[derive(Debug, Clone, Serialize)]
pub struct SoilResponse {
    pub success: bool,
    pub soil_data: SoilSnapshot,
    pub message: String,
}

/// Weather block of the polygon-weather response.
#[derive(Debug, Clone, Serialize)]
pub struct FarmWeatherReadings {
    pub temp: i64,
    pub feels_like: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub icon: String,
}

/// Normalized weather conditions at a farm's center.
#[derive(Debug, Clone, Serialize)]
pub struct FarmWeather {
    pub polygon_id: String,
    pub polygon_name: String,
    pub coordinates: Coordinate,
    pub area_hectares: String,
    pub weather: FarmWeatherReadings,
    pub wind: Wind,
    pub sun: SunTimes,
    pub timestamp: i64,
}

/// Response body for `GET /api/polygon-weather/:polygon_id`.
#[derive(Debug, Clone, Serialize)]
pub struct FarmWeatherResponse {
    pub success: bool,
    pub weather_data: FarmWeather,
    pub message: String,
}

/// NDVI statistics of one observation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NdviStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub num: i64,
}

/// One normalized NDVI observation.
#[derive(Debug, Clone, Serialize)]
pub struct NdviRecord {
    /// Observation day as `YYYY-MM-DD`.
    pub date: String,

    /// Unix timestamp of the observation.
    pub timestamp: i64,

    pub ndvi: NdviStats,

    /// Cloud coverage in percent.
    pub cloud_coverage: f64,
}

/// Identity block of the NDVI response.
#[derive(Debug, Clone, Serialize)]
pub struct PolygonInfo {
    pub id: String,
    pub name: String,
    pub area_hectares: String,
}

/// Response body for `GET /api/polygon-ndvi/:polygon_id`.
#[derive(Debug, Clone, Serialize)]
pub struct NdviResponse {
    pub success: bool,
    pub polygon_info: PolygonInfo,
    pub ndvi_data: Vec<NdviRecord>,
    pub total_records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_query_defaults() {
        let query = CoordinateQuery {
            lat: None,
            lon: None,
        };
        let coordinate = query.coordinate();

        assert_eq!(coordinate.lat, DEFAULT_LAT);
        assert_eq!(coordinate.lon, DEFAULT_LON);
    }

    #[test]
    fn test_coordinate_query_explicit() {
        let query = CoordinateQuery {
            lat: Some(11.0168),
            lon: Some(76.9558),
        };
        let coordinate = query.coordinate();

        assert_eq!(coordinate.lat, 11.0168);
        assert_eq!(coordinate.lon, 76.9558);
    }

    #[test]
    fn test_location_info_full_name_key() {
        let value = serde_json::to_value(LocationInfo::fallback()).unwrap();

        assert_eq!(value["fullName"], "Current Location");
        assert_eq!(value["country"], "India");
        assert!(value.get("full_name").is_none());
    }

    #[test]
    fn test_location_response_flattens() {
        let response = LocationResponse {
            location: LocationInfo::fallback(),
            coordinates: Coordinate {
                lat: 10.79,
                lon: 78.70,
            },
        };
        let value = serde_json::to_value(response).unwrap();

        assert_eq!(value["name"], "Current Location");
        assert_eq!(value["coordinates"]["lat"], 10.79);
    }
}
