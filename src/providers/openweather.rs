//! General weather provider client.
//!
//! Serves the location-based weather and forecast endpoints. Unlike the
//! agro-monitoring provider this one is queried with `units=metric`, so
//! temperatures arrive already in Celsius and only need rounding.

use serde::{Deserialize, Serialize};

use super::{UpstreamError, get_json};

/// Base URL for the weather API.
const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

/// Provider label used in errors.
const PROVIDER: &str = "openweather";

/// Client for current weather and 3-hour-interval forecasts.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENWEATHER_API_BASE.to_string(),
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

    /// Fetch current weather for a coordinate, metric units.
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<OwmCurrent, UpstreamError> {
        let url = format!(
            "{}/weather?lat={}&lon={}&units=metric&appid={}",
            self.base_url, lat, lon, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }

    /// Fetch the 5-day / 3-hour forecast for a coordinate, metric units.
    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<OwmForecast, UpstreamError> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&units=metric&appid={}",
            self.base_url, lat, lon, self.api_key
        );

        get_json(&self.client, PROVIDER, &url).await
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Current-weather response, Celsius temperatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmCurrent {
    /// Unix timestamp of the reading.
    #[serde(default)]
    pub dt: Option<i64>,

    #[serde(default)]
    pub main: OwmMain,

    #[serde(default)]
    pub wind: OwmWind,

    #[serde(default)]
    pub clouds: OwmClouds,

    /// Weather conditions; usually a single entry.
    #[serde(default)]
    pub weather: Vec<OwmCondition>,

    #[serde(default)]
    pub sys: OwmSys,
}

impl OwmCurrent {
    /// The primary weather condition, when one was reported.
    pub fn condition(&self) -> Option<&OwmCondition> {
        self.weather.first()
    }
}

/// Main readings block. Temperatures are Celsius and may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmMain {
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
pub struct OwmWind {
    /// Speed in m/s.
    #[serde(default)]
    pub speed: f64,

    /// Direction in meteorological degrees.
    #[serde(default)]
    pub deg: f64,
}

/// Cloud cover reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmClouds {
    /// Cloudiness in percent.
    #[serde(default)]
    pub all: i64,
}

/// A single weather condition entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmCondition {
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

/// Country and sun times for a current-weather reading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmSys {
    /// ISO country code.
    #[serde(default)]
    pub country: Option<String>,

    /// Sunrise as a Unix timestamp.
    #[serde(default)]
    pub sunrise: i64,

    /// Sunset as a Unix timestamp.
    #[serde(default)]
    pub sunset: i64,
}

/// Forecast response: an ordered list of 3-hour entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmForecast {
    #[serde(default)]
    pub list: Vec<OwmForecastEntry>,
}

/// One 3-hour forecast entry, Celsius temperatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmForecastEntry {
    /// Unix timestamp of the forecast slot.
    #[serde(default)]
    pub dt: i64,

    #[serde(default)]
    pub main: OwmMain,

    #[serde(default)]
    pub weather: Vec<OwmCondition>,

    #[serde(default)]
    pub wind: OwmWind,

    #[serde(default)]
    pub clouds: OwmClouds,

    /// Precipitation volume for the slot, when raining.
    #[serde(default)]
    pub rain: Option<OwmRain>,

    /// Provider-rendered timestamp string for the slot.
    #[serde(default)]
    pub dt_txt: String,
}

impl OwmForecastEntry {
    /// The primary weather condition, when one was reported.
    pub fn condition(&self) -> Option<&OwmCondition> {
        self.weather.first()
    }
}

/// Precipitation volume in mm over the 3-hour slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwmRain {
    #[serde(default, rename = "3h")]
    pub three_hour: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_parses_metric_payload() {
        let raw = r#"{
            "dt": 1661870592,
            "main": {"temp": 27.4, "feels_like": 29.1, "temp_min": 26.0, "temp_max": 28.3, "humidity": 64, "pressure": 1012},
            "wind": {"speed": 3.1, "deg": 230},
            "clouds": {"all": 40},
            "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d"}],
            "sys": {"country": "IN", "sunrise": 1661834187, "sunset": 1661878985}
        }"#;
        let current: OwmCurrent = serde_json::from_str(raw).unwrap();

        assert_eq!(current.main.temp, Some(27.4));
        assert_eq!(current.sys.country.as_deref(), Some("IN"));
        assert_eq!(current.condition().and_then(|c| c.id), Some(802));
        assert_eq!(current.wind.deg, 230.0);
    }

    #[test]
    fn test_forecast_entry_rain_rename() {
        let raw = r#"{
            "dt": 1661871600,
            "main": {"temp": 25.2, "humidity": 70, "pressure": 1010},
            "rain": {"3h": 0.26},
            "dt_txt": "2022-08-30 15:00:00"
        }"#;
        let entry: OwmForecastEntry = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.rain.and_then(|r| r.three_hour), Some(0.26));
        assert_eq!(entry.dt_txt, "2022-08-30 15:00:00");
    }

    #[test]
    fn test_forecast_defaults_to_empty_list() {
        let forecast: OwmForecast = serde_json::from_str("{}").unwrap();

        assert!(forecast.list.is_empty());
    }
}
