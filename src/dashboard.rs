//! Farm dashboard aggregation.
//!
//! The dashboard is the one composite view in the system: polygon metadata,
//! the latest soil reading, weather at the polygon's center, and 30 days of
//! NDVI history merged into a single payload with derived health status and
//! advisories.
//!
//! The merge is all-or-nothing. The polygon fetch is a sequential
//! prerequisite (later calls need its center); the three data fetches then
//! run concurrently with fail-fast semantics — the first error wins and no
//! partial dashboard is ever returned.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::normalize::{
    HealthStatus, area_hectares, fertilization_advice, irrigation_advice, iso_day,
    kelvin_to_celsius, pest_advice,
};
use crate::providers::UpstreamError;
use crate::providers::agromonitoring::{
    AgroMonitoringClient, AgroNdviEntry, AgroPolygon, AgroSoil, AgroWeather,
};

/// NDVI history window feeding the dashboard, in days.
const NDVI_LOOKBACK_DAYS: i64 = 30;

/// Fetch everything a dashboard needs and compose it.
///
/// Fails with the first upstream error encountered; in-flight sibling calls
/// are dropped, not awaited.
pub async fn build_farm_dashboard(
    agro: &AgroMonitoringClient,
    polygon_id: &str,
    now: DateTime<Utc>,
) -> Result<FarmDashboard, UpstreamError> {
    let polygon = agro.polygon(polygon_id).await?;
    let (lat, lon) = polygon.center_lat_lon().ok_or_else(|| {
        UpstreamError::new("agromonitoring", "polygon has no center coordinates")
    })?;

    let end = now.timestamp();
    let start = end - NDVI_LOOKBACK_DAYS * 24 * 3600;

    let (soil, weather, ndvi) = tokio::try_join!(
        agro.soil(polygon_id),
        agro.current_weather(lat, lon),
        agro.ndvi_history(polygon_id, start, end),
    )?;

    Ok(compose_dashboard(&polygon, &soil, &weather, &ndvi, now))
}

/// Merge already-fetched provider data into a dashboard.
pub fn compose_dashboard(
    polygon: &AgroPolygon,
    soil: &AgroSoil,
    weather: &AgroWeather,
    ndvi: &[AgroNdviEntry],
    now: DateTime<Utc>,
) -> FarmDashboard {
    let temperature = weather.main.temp.map(kelvin_to_celsius).unwrap_or(0);
    let humidity = weather.main.humidity;
    let latest_mean = ndvi.last().map(|entry| entry.data.mean);

    FarmDashboard {
        farm_info: FarmInfo {
            id: polygon.id.clone(),
            name: polygon.name.clone(),
            area_hectares: area_hectares(polygon.area),
            center_coordinates: polygon.center.clone(),
            created_at: polygon.created_at,
        },
        current_conditions: CurrentConditions {
            weather: DashboardWeather {
                temperature,
                feels_like: weather.main.feels_like.map(kelvin_to_celsius).unwrap_or(0),
                humidity,
                description: weather
                    .condition()
                    .and_then(|c| c.description.clone())
                    .unwrap_or_else(|| "clear sky".to_string()),
                wind_speed: weather.wind.speed,
            },
            soil: DashboardSoil {
                surface_temp: soil.t0.map(kelvin_to_celsius),
                soil_temp_10cm: soil.t10.map(kelvin_to_celsius),
                moisture: soil.moisture,
                last_updated: DateTime::from_timestamp(soil.dt, 0)
                    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .unwrap_or_default(),
            },
        },
        crop_health: CropHealth {
            recent_ndvi: recent_ndvi(ndvi),
            health_status: HealthStatus::from_mean_ndvi(latest_mean),
        },
        recommendations: Recommendations {
            irrigation: irrigation_advice(humidity),
            fertilization: fertilization_advice(latest_mean),
            pest_monitoring: pest_advice(temperature, humidity),
        },
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Summarize the tail of the NDVI history; `None` when there is none.
fn recent_ndvi(ndvi: &[AgroNdviEntry]) -> Option<RecentNdvi> {
    let latest = ndvi.last()?;
    let trend = if ndvi.len() > 1 {
        latest.data.mean - ndvi[ndvi.len() - 2].data.mean
    } else {
        0.0
    };

    Some(RecentNdvi {
        latest_value: latest.data.mean,
        date: iso_day(latest.dt),
        trend,
        total_measurements: ndvi.len(),
    })
}

// ============================================================================
// Dashboard types
// ============================================================================

/// Response body for `GET /api/farm-dashboard/:polygon_id`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub dashboard: FarmDashboard,
}

/// The composed dashboard view. Recomputed in full on every request.
#[derive(Debug, Clone, Serialize)]
pub struct FarmDashboard {
    pub farm_info: FarmInfo,
    pub current_conditions: CurrentConditions,
    pub crop_health: CropHealth,
    pub recommendations: Recommendations,

    /// When this dashboard was composed, ISO 8601.
    pub last_updated: String,
}

/// Farm identity block.
#[derive(Debug, Clone, Serialize)]
pub struct FarmInfo {
    pub id: String,
    pub name: String,
    pub area_hectares: String,

    /// Centroid as `[lon, lat]`, when the provider supplied one.
    pub center_coordinates: Option<Vec<f64>>,

    pub created_at: Option<i64>,
}

/// Weather and soil conditions at composition time.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub weather: DashboardWeather,
    pub soil: DashboardSoil,
}

/// Condensed weather block of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardWeather {
    /// Celsius.
    pub temperature: i64,

    /// Celsius.
    pub feels_like: i64,

    pub humidity: i64,
    pub description: String,
    pub wind_speed: f64,
}

/// Condensed soil block of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSoil {
    /// Celsius, `null` when unreported.
    pub surface_temp: Option<i64>,

    /// Celsius, `null` when unreported.
    pub soil_temp_10cm: Option<i64>,

    pub moisture: Option<f64>,

    /// ISO rendering of the reading's timestamp.
    pub last_updated: String,
}

/// Crop-health block derived from NDVI history.
#[derive(Debug, Clone, Serialize)]
pub struct CropHealth {
    /// `null` when no NDVI observation exists in the window.
    pub recent_ndvi: Option<RecentNdvi>,

    pub health_status: HealthStatus,
}

/// Tail summary of the NDVI history.
#[derive(Debug, Clone, Serialize)]
pub struct RecentNdvi {
    /// Latest NDVI mean.
    pub latest_value: f64,

    /// Day of the latest observation, `YYYY-MM-DD`.
    pub date: String,

    /// Latest mean minus the previous mean; 0 with a single observation.
    pub trend: f64,

    pub total_measurements: usize,
}

/// Advisory strings derived from fixed thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub irrigation: &'static str,
    pub fertilization: &'static str,
    pub pest_monitoring: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::agromonitoring::{AgroMain, AgroNdviStats};

    fn polygon() -> AgroPolygon {
        AgroPolygon {
            id: "poly-1".to_string(),
            name: "Green Acres".to_string(),
            geo_json: None,
            area: Some(250000.0),
            center: Some(vec![78.7047, 10.7905]),
            created_at: Some(1700000000),
            user_id: None,
        }
    }

    fn weather(temp_kelvin: f64, humidity: i64) -> AgroWeather {
        AgroWeather {
            dt: Some(1485789600),
            main: AgroMain {
                temp: Some(temp_kelvin),
                feels_like: Some(temp_kelvin + 2.0),
                humidity,
                pressure: 1007,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ndvi_entry(dt: i64, mean: f64) -> AgroNdviEntry {
        AgroNdviEntry {
            dt,
            data: AgroNdviStats {
                mean,
                ..Default::default()
            },
            cl: 0.0,
        }
    }

    #[test]
    fn test_compose_full_dashboard() {
        let soil = AgroSoil {
            dt: 1522108800,
            t0: Some(300.15),
            t10: Some(298.15),
            moisture: Some(0.175),
        };
        let ndvi = vec![ndvi_entry(1527811200, 0.35), ndvi_entry(1530316800, 0.45)];

        let dashboard =
            compose_dashboard(&polygon(), &soil, &weather(301.15, 75), &ndvi, Utc::now());

        assert_eq!(dashboard.farm_info.area_hectares, "25.00");
        assert_eq!(dashboard.current_conditions.weather.temperature, 28);
        assert_eq!(dashboard.current_conditions.soil.surface_temp, Some(27));
        assert_eq!(dashboard.crop_health.health_status, HealthStatus::Good);

        let recent = dashboard.crop_health.recent_ndvi.unwrap();
        assert_eq!(recent.latest_value, 0.45);
        assert_eq!(recent.total_measurements, 2);
        assert!((recent.trend - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_compose_without_ndvi() {
        let soil = AgroSoil::default();

        let dashboard = compose_dashboard(&polygon(), &soil, &weather(295.15, 80), &[], Utc::now());

        assert!(dashboard.crop_health.recent_ndvi.is_none());
        assert_eq!(dashboard.crop_health.health_status, HealthStatus::NoData);
        assert_eq!(
            dashboard.recommendations.fertilization,
            "Crop health appears good"
        );
    }

    #[test]
    fn test_single_observation_has_zero_trend() {
        let ndvi = vec![ndvi_entry(1530316800, 0.55)];

        let dashboard = compose_dashboard(
            &polygon(),
            &AgroSoil::default(),
            &weather(300.15, 50),
            &ndvi,
            Utc::now(),
        );

        let recent = dashboard.crop_health.recent_ndvi.unwrap();
        assert_eq!(recent.trend, 0.0);
        assert_eq!(recent.date, "2018-06-30");
    }

    #[test]
    fn test_recommendations_thresholds() {
        // 301.15 K = 28 C with 75% humidity: hot and humid.
        let humid = compose_dashboard(
            &polygon(),
            &AgroSoil::default(),
            &weather(301.15, 75),
            &[ndvi_entry(1530316800, 0.3)],
            Utc::now(),
        );

        assert_eq!(humid.recommendations.irrigation, "Adequate moisture");
        assert_eq!(
            humid.recommendations.pest_monitoring,
            "High risk conditions for pests"
        );
        assert_eq!(
            humid.recommendations.fertilization,
            "Consider fertilizer application"
        );

        // 295.15 K = 22 C with 50% humidity: dry and mild.
        let dry = compose_dashboard(
            &polygon(),
            &AgroSoil::default(),
            &weather(295.15, 50),
            &[],
            Utc::now(),
        );

        assert_eq!(dry.recommendations.irrigation, "Consider irrigation");
        assert_eq!(
            dry.recommendations.pest_monitoring,
            "Normal monitoring sufficient"
        );
    }

    #[test]
    fn test_missing_soil_fields_stay_null() {
        let dashboard = compose_dashboard(
            &polygon(),
            &AgroSoil::default(),
            &weather(300.15, 65),
            &[],
            Utc::now(),
        );

        assert_eq!(dashboard.current_conditions.soil.surface_temp, None);
        assert_eq!(dashboard.current_conditions.soil.moisture, None);
    }
}
