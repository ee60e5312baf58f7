//! Normalization of provider responses into the dashboard contract.
//!
//! Two upstream weather providers disagree on units: the agro-monitoring
//! API reports Kelvin, the general weather API reports Celsius when queried
//! metric. Everything leaving this module is integer Celsius. The other
//! fixed rules live here too: the weather-code → icon table, NDVI
//! health-status bucketing, the advisory thresholds, and hectare
//! formatting.
//!
//! All functions are pure; handlers feed them already-fetched provider
//! structs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::model::{
    AgroDataMain, AgroDataResponse, Clouds, Coordinate, CurrentWeatherResponse, FarmWeather,
    FarmWeatherReadings, ForecastCity, ForecastEntry, ForecastResponse, LocationInfo,
    MainReadings, NdviRecord, NdviStats, SoilSnapshot, SysInfo, WeatherCondition, Wind,
};
use crate::providers::agromonitoring::{
    AgroNdviEntry, AgroPolygon, AgroSoil, AgroWeather,
};
use crate::providers::openweather::{OwmCondition, OwmCurrent, OwmForecast, OwmMain};
use crate::providers::sunrise::SunTimes;

/// Convert a Kelvin reading to rounded integer Celsius.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - 273.15).round() as i64
}

/// Round an already-Celsius reading to an integer.
pub fn celsius_rounded(celsius: f64) -> i64 {
    celsius.round() as i64
}

/// Map a provider weather-condition code to an icon code.
///
/// Codes are bucketed to their hundred (741 → 700) and looked up in a fixed
/// table; unmapped buckets fall back to the clear-sky icon.
pub fn weather_icon(condition_id: i64) -> &'static str {
    match (condition_id / 100) * 100 {
        200 => "11d", // thunderstorm
        300 => "09d", // drizzle
        500 => "10d", // rain
        600 => "13d", // snow
        700 => "50d", // mist/fog
        800 => "01d", // clear
        801 => "02d", // few clouds
        802 => "03d", // scattered clouds
        803 => "04d", // broken clouds
        804 => "04d", // overcast
        _ => "01d",
    }
}

/// Crop health bucket derived from the latest NDVI mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,

    #[serde(rename = "No data")]
    NoData,
}

impl HealthStatus {
    /// Bucket an NDVI mean; `None` means no observation exists.
    ///
    /// # Thresholds
    ///
    /// - `Excellent`: mean > 0.6
    /// - `Good`: mean > 0.4
    /// - `Fair`: mean > 0.2
    /// - `Poor`: anything lower
    pub fn from_mean_ndvi(mean: Option<f64>) -> Self {
        match mean {
            None => HealthStatus::NoData,
            Some(m) if m > 0.6 => HealthStatus::Excellent,
            Some(m) if m > 0.4 => HealthStatus::Good,
            Some(m) if m > 0.2 => HealthStatus::Fair,
            Some(_) => HealthStatus::Poor,
        }
    }
}

/// Irrigation advisory from current humidity.
pub fn irrigation_advice(humidity: i64) -> &'static str {
    if humidity < 60 {
        "Consider irrigation"
    } else {
        "Adequate moisture"
    }
}

/// Fertilization advisory from the latest NDVI mean, when one exists.
pub fn fertilization_advice(latest_mean: Option<f64>) -> &'static str {
    match latest_mean {
        Some(mean) if mean < 0.4 => "Consider fertilizer application",
        _ => "Crop health appears good",
    }
}

/// Pest-risk advisory from temperature (Celsius) and humidity.
pub fn pest_advice(temp_celsius: i64, humidity: i64) -> &'static str {
    if temp_celsius > 25 && humidity > 70 {
        "High risk conditions for pests"
    } else {
        "Normal monitoring sufficient"
    }
}

/// Format a square-meter area as hectares with two decimals, or `"N/A"`
/// when the provider reported nothing usable.
pub fn area_hectares(area: Option<f64>) -> String {
    match area {
        Some(a) if a > 0.0 => format!("{:.2}", a / 10000.0),
        _ => "N/A".to_string(),
    }
}

/// Render a Unix timestamp as an ISO 8601 instant with milliseconds.
pub fn iso_instant(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Render a Unix timestamp as a `YYYY-MM-DD` day.
pub fn iso_day(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ============================================================================
// Provider-shape → contract-shape mapping
// ============================================================================

fn main_readings_metric(main: &OwmMain) -> MainReadings {
    MainReadings {
        temp: main.temp.map(celsius_rounded).unwrap_or(0),
        feels_like: main.feels_like.map(celsius_rounded).unwrap_or(0),
        temp_min: main.temp_min.map(celsius_rounded).unwrap_or(0),
        temp_max: main.temp_max.map(celsius_rounded).unwrap_or(0),
        humidity: main.humidity,
        pressure: main.pressure,
    }
}

fn condition_metric(condition: Option<&OwmCondition>) -> WeatherCondition {
    let id = condition.and_then(|c| c.id).unwrap_or(800);
    let icon = condition
        .and_then(|c| c.icon.clone())
        .filter(|icon| !icon.is_empty())
        .unwrap_or_else(|| weather_icon(id).to_string());

    WeatherCondition {
        id,
        main: condition
            .and_then(|c| c.main.clone())
            .unwrap_or_else(|| "Clear".to_string()),
        description: condition
            .and_then(|c| c.description.clone())
            .unwrap_or_else(|| "clear sky".to_string()),
        icon,
    }
}

/// Country code shown for a resolved location: the frontend expects "IN"
/// for Indian locations regardless of what the weather provider says.
fn country_code(location: &LocationInfo, provider_country: Option<&str>) -> String {
    if location.country == "India" {
        "IN".to_string()
    } else {
        provider_country.unwrap_or("IN").to_string()
    }
}

/// Build the `GET /api/weather` body from a metric current-weather reading.
pub fn current_weather_response(
    raw: &OwmCurrent,
    location: &LocationInfo,
    coordinates: Coordinate,
) -> CurrentWeatherResponse {
    CurrentWeatherResponse {
        name: location.name.clone(),
        full_name: location.full_name.clone(),
        coordinates,
        sys: SysInfo {
            country: country_code(location, raw.sys.country.as_deref()),
            state: location.state.clone(),
            sunrise: raw.sys.sunrise,
            sunset: raw.sys.sunset,
        },
        main: main_readings_metric(&raw.main),
        wind: Wind {
            speed: raw.wind.speed,
            deg: raw.wind.deg,
        },
        clouds: Clouds {
            all: raw.clouds.all,
        },
        weather: vec![condition_metric(raw.condition())],
        dt: raw.dt.unwrap_or(0),
        timezone: "Asia/Kolkata".to_string(),
    }
}

/// Build the `GET /api/forecast` body from a metric forecast.
pub fn forecast_response(
    raw: OwmForecast,
    location: &LocationInfo,
    coordinates: Coordinate,
) -> ForecastResponse {
    let country = if location.country == "India" {
        "IN".to_string()
    } else {
        location.country.clone()
    };

    let list = raw
        .list
        .into_iter()
        .map(|entry| ForecastEntry {
            dt: entry.dt,
            main: main_readings_metric(&entry.main),
            weather: vec![condition_metric(entry.weather.first())],
            wind: Wind {
                speed: entry.wind.speed,
                deg: entry.wind.deg,
            },
            clouds: Clouds {
                all: entry.clouds.all,
            },
            rain: entry.rain,
            dt_txt: entry.dt_txt,
        })
        .collect();

    ForecastResponse {
        city: ForecastCity {
            name: location.name.clone(),
            full_name: location.full_name.clone(),
            country,
            state: location.state.clone(),
            coordinates,
        },
        list,
    }
}

/// Build the `GET /api/agro-data` body: the agronomic reading passed
/// through with its `main` block converted from Kelvin.
pub fn agro_data_response(raw: AgroWeather, coordinates: Coordinate) -> AgroDataResponse {
    AgroDataResponse {
        coordinates,
        main: AgroDataMain {
            temp: raw.main.temp.map(kelvin_to_celsius).unwrap_or(0),
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
        },
        wind: Wind {
            speed: raw.wind.speed,
            deg: raw.wind.deg,
        },
        clouds: Clouds {
            all: raw.clouds.all,
        },
        rain: raw.rain,
        dt: raw.dt.unwrap_or(0),
    }
}

/// Build a [`SoilSnapshot`] from the provider's Kelvin soil reading.
pub fn soil_snapshot(polygon_id: &str, raw: AgroSoil) -> SoilSnapshot {
    SoilSnapshot {
        polygon_id: polygon_id.to_string(),
        timestamp: raw.dt,
        date: iso_instant(raw.dt),
        surface_temp: raw.t0.map(kelvin_to_celsius),
        soil_temp_10cm: raw.t10.map(kelvin_to_celsius),
        moisture: raw.moisture,
        raw_data: raw,
    }
}

/// Normalize an NDVI history into contract records, preserving order.
pub fn ndvi_records(raw: Vec<AgroNdviEntry>) -> Vec<NdviRecord> {
    raw.into_iter()
        .map(|entry| NdviRecord {
            date: iso_day(entry.dt),
            timestamp: entry.dt,
            ndvi: NdviStats {
                min: entry.data.min,
                max: entry.data.max,
                mean: entry.data.mean,
                std: entry.data.std,
                num: entry.data.num,
            },
            cloud_coverage: entry.cl,
        })
        .collect()
}

/// Build the weather block of `GET /api/polygon-weather/:polygon_id` from
/// the Kelvin reading at a farm's center plus its sun times.
pub fn farm_weather(
    polygon: &AgroPolygon,
    raw: &AgroWeather,
    sun: SunTimes,
    coordinates: Coordinate,
    now: DateTime<Utc>,
) -> FarmWeather {
    let condition_id = raw.condition().and_then(|c| c.id).unwrap_or(800);

    FarmWeather {
        polygon_id: polygon.id.clone(),
        polygon_name: polygon.name.clone(),
        coordinates,
        area_hectares: area_hectares(polygon.area),
        weather: FarmWeatherReadings {
            temp: raw.main.temp.map(kelvin_to_celsius).unwrap_or(0),
            feels_like: raw.main.feels_like.map(kelvin_to_celsius).unwrap_or(0),
            temp_min: raw.main.temp_min.map(kelvin_to_celsius).unwrap_or(0),
            temp_max: raw.main.temp_max.map(kelvin_to_celsius).unwrap_or(0),
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            description: raw
                .condition()
                .and_then(|c| c.description.clone())
                .unwrap_or_else(|| "clear sky".to_string()),
            icon: weather_icon(condition_id).to_string(),
        },
        wind: Wind {
            speed: raw.wind.speed,
            deg: raw.wind.deg,
        },
        sun,
        timestamp: raw.dt.unwrap_or_else(|| now.timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::agromonitoring::AgroMain;

    #[test]
    fn test_kelvin_to_celsius() {
        assert_eq!(kelvin_to_celsius(300.15), 27);
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(255.65), -18);
    }

    #[test]
    fn test_celsius_rounded() {
        assert_eq!(celsius_rounded(27.4), 27);
        assert_eq!(celsius_rounded(27.5), 28);
    }

    #[test]
    fn test_weather_icon_bucketing() {
        assert_eq!(weather_icon(741), "50d");
        assert_eq!(weather_icon(200), "11d");
        assert_eq!(weather_icon(502), "10d");
        assert_eq!(weather_icon(800), "01d");
    }

    #[test]
    fn test_weather_icon_unmapped_bucket() {
        assert_eq!(weather_icon(999), "01d");
        assert_eq!(weather_icon(0), "01d");
    }

    #[test]
    fn test_health_status_buckets() {
        assert_eq!(
            HealthStatus::from_mean_ndvi(Some(0.65)),
            HealthStatus::Excellent
        );
        assert_eq!(HealthStatus::from_mean_ndvi(Some(0.45)), HealthStatus::Good);
        assert_eq!(HealthStatus::from_mean_ndvi(Some(0.25)), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_mean_ndvi(Some(0.1)), HealthStatus::Poor);
        assert_eq!(HealthStatus::from_mean_ndvi(None), HealthStatus::NoData);
    }

    #[test]
    fn test_health_status_serializes_no_data_label() {
        let value = serde_json::to_value(HealthStatus::NoData).unwrap();
        assert_eq!(value, "No data");

        let value = serde_json::to_value(HealthStatus::Excellent).unwrap();
        assert_eq!(value, "Excellent");
    }

    #[test]
    fn test_irrigation_advice() {
        assert_eq!(irrigation_advice(55), "Consider irrigation");
        assert_eq!(irrigation_advice(75), "Adequate moisture");
        assert_eq!(irrigation_advice(60), "Adequate moisture");
    }

    #[test]
    fn test_fertilization_advice() {
        assert_eq!(
            fertilization_advice(Some(0.3)),
            "Consider fertilizer application"
        );
        assert_eq!(fertilization_advice(Some(0.5)), "Crop health appears good");
        assert_eq!(fertilization_advice(None), "Crop health appears good");
    }

    #[test]
    fn test_pest_advice_needs_both_conditions() {
        assert_eq!(pest_advice(26, 75), "High risk conditions for pests");
        assert_eq!(pest_advice(26, 60), "Normal monitoring sufficient");
        assert_eq!(pest_advice(20, 80), "Normal monitoring sufficient");
    }

    #[test]
    fn test_area_hectares_formatting() {
        assert_eq!(area_hectares(Some(250000.0)), "25.00");
        assert_eq!(area_hectares(Some(190.1)), "0.02");
        assert_eq!(area_hectares(None), "N/A");
        assert_eq!(area_hectares(Some(0.0)), "N/A");
    }

    #[test]
    fn test_iso_rendering() {
        assert_eq!(iso_instant(1522108800), "2018-03-27T00:00:00.000Z");
        assert_eq!(iso_day(1530316800), "2018-06-30");
    }

    #[test]
    fn test_soil_snapshot_converts_kelvin() {
        let raw = AgroSoil {
            dt: 1522108800,
            t0: Some(300.15),
            t10: None,
            moisture: Some(0.175),
        };

        let snapshot = soil_snapshot("5abb9f", raw);

        assert_eq!(snapshot.surface_temp, Some(27));
        assert_eq!(snapshot.soil_temp_10cm, None);
        assert_eq!(snapshot.moisture, Some(0.175));
        assert_eq!(snapshot.date, "2018-03-27T00:00:00.000Z");
        assert_eq!(snapshot.raw_data.t0, Some(300.15));
    }

    #[test]
    fn test_agro_data_defaults_missing_temp_to_zero() {
        let raw = AgroWeather {
            dt: Some(1485789600),
            main: AgroMain {
                temp: None,
                humidity: 87,
                pressure: 1007,
                ..Default::default()
            },
            ..Default::default()
        };

        let response = agro_data_response(
            raw,
            Coordinate {
                lat: 10.79,
                lon: 78.70,
            },
        );

        assert_eq!(response.main.temp, 0);
        assert_eq!(response.main.humidity, 87);
    }

    #[test]
    fn test_current_weather_response_india_country() {
        let mut raw = OwmCurrent::default();
        raw.dt = Some(1661870592);
        raw.main.temp = Some(27.4);
        raw.sys.country = Some("XX".to_string());

        let location = LocationInfo {
            name: "Trichy".to_string(),
            state: "Tamil Nadu".to_string(),
            country: "India".to_string(),
            full_name: "Trichy, Tamil Nadu".to_string(),
        };

        let response = current_weather_response(
            &raw,
            &location,
            Coordinate {
                lat: 10.79,
                lon: 78.70,
            },
        );

        assert_eq!(response.sys.country, "IN");
        assert_eq!(response.main.temp, 27);
        assert_eq!(response.timezone, "Asia/Kolkata");
        assert_eq!(response.weather.len(), 1);
        assert_eq!(response.weather[0].id, 800);
    }

    #[test]
    fn test_ndvi_records_preserve_order() {
        let raw = vec![
            AgroNdviEntry {
                dt: 1530316800,
                cl: 4.5,
                ..Default::default()
            },
            AgroNdviEntry {
                dt: 1530403200,
                ..Default::default()
            },
        ];

        let records = ndvi_records(raw);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2018-06-30");
        assert_eq!(records[0].cloud_coverage, 4.5);
        assert!(records[0].timestamp < records[1].timestamp);
    }
}
