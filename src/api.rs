//! HTTP API handlers.
//!
//! Every endpoint is a stateless request/response: validate what little
//! input needs validating, fan out to the providers, normalize, respond.
//! There is no cross-request memory and no caching — each request triggers
//! fresh upstream calls.
//!
//! Missing provider keys surface here as 500s per request rather than
//! refusing startup, so the endpoints that do have their keys keep working.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::dashboard::{DashboardResponse, build_farm_dashboard};
use crate::error::ApiError;
use crate::model::{
    AgroDataResponse, Coordinate, CoordinateQuery, CreateFarmRequest, CreateFarmResponse,
    CurrentWeatherResponse, FarmSummary, FarmWeatherResponse, ForecastResponse,
    ListFarmsResponse, LocationInfo, LocationResponse, NdviRangeQuery, NdviResponse,
    PolygonInfo, SoilResponse,
};
use crate::normalize;
use crate::providers::{
    AgroMonitoringClient, GeocodingClient, OpenWeatherClient, SunriseClient,
};

/// Default NDVI history window for the standalone endpoint, in days.
const NDVI_DEFAULT_RANGE_DAYS: i64 = 90;

/// Application state shared across handlers: one client per provider.
///
/// Clients for keyed providers are `None` when their key is unset; the
/// handlers that need them answer with a configuration error instead.
#[derive(Clone)]
pub struct AppState {
    pub weather: Option<OpenWeatherClient>,
    pub agro: Option<AgroMonitoringClient>,
    pub geocoder: Option<GeocodingClient>,
    pub sun: SunriseClient,
}

impl AppState {
    /// Build state from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            weather: config
                .openweather_api_key
                .as_deref()
                .map(OpenWeatherClient::new),
            agro: config.agro_api_key.as_deref().map(AgroMonitoringClient::new),
            geocoder: config
                .geocoding_api_key
                .as_deref()
                .map(GeocodingClient::new),
            sun: SunriseClient::new(),
        }
    }

    fn weather(&self) -> Result<&OpenWeatherClient, ApiError> {
        self.weather
            .as_ref()
            .ok_or(ApiError::Misconfigured("OpenWeather API key not configured"))
    }

    fn agro(&self) -> Result<&AgroMonitoringClient, ApiError> {
        self.agro.as_ref().ok_or(ApiError::Misconfigured(
            "AgroMonitoring API key not configured",
        ))
    }

    /// Resolve a coordinate into a place name, falling back to the default
    /// location on any failure. Location naming never fails a request.
    async fn resolve_location(&self, lat: f64, lon: f64) -> LocationInfo {
        match &self.geocoder {
            Some(client) => match client.reverse(lat, lon).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(error = %e, "reverse geocoding failed; using fallback location");
                    LocationInfo::fallback()
                }
            },
            None => LocationInfo::fallback(),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/weather", get(get_weather))
        .route("/api/forecast", get(get_forecast))
        .route("/api/location", get(get_location))
        .route("/api/agro-data", get(get_agro_data))
        .route("/api/polygons", get(list_farms).post(create_farm))
        .route("/api/soil/:polygon_id", get(get_soil))
        .route("/api/polygon-weather/:polygon_id", get(get_polygon_weather))
        .route("/api/polygon-ndvi/:polygon_id", get(get_polygon_ndvi))
        .route("/api/farm-dashboard/:polygon_id", get(get_farm_dashboard))
        .route("/api/health", get(health_check))
        .with_state(state)
}

/// GET /api/weather - Current weather for a coordinate.
///
/// Coordinates default to the standard location when omitted.
#[instrument(skip(state))]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<CurrentWeatherResponse>, ApiError> {
    let coordinates = query.coordinate();
    let client = state.weather()?;

    let location = state
        .resolve_location(coordinates.lat, coordinates.lon)
        .await;
    let raw = client
        .current_weather(coordinates.lat, coordinates.lon)
        .await
        .map_err(ApiError::upstream("Failed to fetch weather data"))?;

    let response = normalize::current_weather_response(&raw, &location, coordinates);
    info!(
        location = %response.full_name,
        temp = response.main.temp,
        "Weather served"
    );
    Ok(Json(response))
}

/// GET /api/forecast - 3-hour-interval forecast for a coordinate.
#[instrument(skip(state))]
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let coordinates = query.coordinate();
    let client = state.weather()?;

    let location = state
        .resolve_location(coordinates.lat, coordinates.lon)
        .await;
    let raw = client
        .forecast(coordinates.lat, coordinates.lon)
        .await
        .map_err(ApiError::upstream("Failed to fetch forecast data"))?;

    let response = normalize::forecast_response(raw, &location, coordinates);
    info!(
        location = %response.city.full_name,
        entries = response.list.len(),
        "Forecast served"
    );
    Ok(Json(response))
}

/// GET /api/location - Resolve a coordinate into a place name.
///
/// The one coordinate endpoint where lat/lon are required rather than
/// defaulted.
#[instrument(skip(state))]
pub async fn get_location(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<LocationResponse>, ApiError> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::BadRequest("Latitude and longitude are required"));
    };

    let location = state.resolve_location(lat, lon).await;
    info!(name = %location.full_name, "Location resolved");
    Ok(Json(LocationResponse {
        location,
        coordinates: Coordinate { lat, lon },
    }))
}

/// GET /api/agro-data - Agronomic weather passthrough with Kelvin-converted
/// `main`.
#[instrument(skip(state))]
pub async fn get_agro_data(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<AgroDataResponse>, ApiError> {
    let coordinates = query.coordinate();
    let agro = state.agro()?;

    let raw = agro
        .current_weather(coordinates.lat, coordinates.lon)
        .await
        .map_err(ApiError::upstream("Failed to fetch agro data"))?;

    let response = normalize::agro_data_response(raw, coordinates);
    info!(temp = response.main.temp, "Agro data served");
    Ok(Json(response))
}

/// POST /api/polygons - Register a farm boundary with the polygon provider.
#[instrument(skip(state, request))]
pub async fn create_farm(
    State(state): State<AppState>,
    Json(request): Json<CreateFarmRequest>,
) -> Result<Json<CreateFarmResponse>, ApiError> {
    let agro = state.agro()?;

    let (name, geo_json) = match (request.name.as_deref(), request.geo_json.as_ref()) {
        (Some(name), Some(geo_json)) if !name.is_empty() => (name, geo_json),
        _ => return Err(ApiError::BadRequest("Name and geo_json are required")),
    };
    validate_ring_coordinates(geo_json)?;

    let polygon = agro
        .create_polygon(name, geo_json)
        .await
        .map_err(ApiError::upstream("Failed to create farm polygon"))?;

    info!(polygon_id = %polygon.id, name, "Farm polygon created");
    let message = format!("Farm \"{name}\" created successfully");
    Ok(Json(CreateFarmResponse {
        success: true,
        polygon,
        message,
    }))
}

/// Range-check every `[lon, lat]` pair in the request's GeoJSON ring.
///
/// Shape problems beyond numeric range (open rings, too few points) are the
/// polygon provider's to reject.
fn validate_ring_coordinates(geo_json: &serde_json::Value) -> Result<(), ApiError> {
    let Some(rings) = geo_json
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(|coordinates| coordinates.as_array())
    else {
        return Ok(());
    };

    for ring in rings.iter().filter_map(|ring| ring.as_array()) {
        for pair in ring.iter().filter_map(|pair| pair.as_array()) {
            let lon = pair.first().and_then(|value| value.as_f64());
            let lat = pair.get(1).and_then(|value| value.as_f64());

            if let (Some(lon), Some(lat)) = (lon, lat) {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ApiError::BadRequest(
                        "Coordinates must be within -90 to 90 latitude and -180 to 180 longitude",
                    ));
                }
            }
        }
    }

    Ok(())
}

/// GET /api/polygons - List every registered farm.
#[instrument(skip(state))]
pub async fn list_farms(
    State(state): State<AppState>,
) -> Result<Json<ListFarmsResponse>, ApiError> {
    let agro = state.agro()?;

    let polygons = agro
        .list_polygons()
        .await
        .map_err(ApiError::upstream("Failed to fetch farm polygons"))?;

    let polygons: Vec<FarmSummary> = polygons
        .into_iter()
        .map(|polygon| FarmSummary {
            area_hectares: normalize::area_hectares(polygon.area),
            polygon,
        })
        .collect();

    info!(count = polygons.len(), "Farm polygons listed");
    Ok(Json(ListFarmsResponse {
        success: true,
        count: polygons.len(),
        polygons,
    }))
}

/// GET /api/soil/:polygon_id - Latest soil conditions for a farm.
#[instrument(skip(state))]
pub async fn get_soil(
    State(state): State<AppState>,
    Path(polygon_id): Path<String>,
) -> Result<Json<SoilResponse>, ApiError> {
    let agro = state.agro()?;

    let raw = agro
        .soil(&polygon_id)
        .await
        .map_err(ApiError::upstream("Failed to fetch soil data"))?;

    let soil_data = normalize::soil_snapshot(&polygon_id, raw);
    info!(polygon_id = %polygon_id, "Soil data served");
    Ok(Json(SoilResponse {
        success: true,
        soil_data,
        message: "Soil conditions for your farm".to_string(),
    }))
}

/// GET /api/polygon-weather/:polygon_id - Weather at a farm's center.
///
/// The weather reading and sun times are independent calls and run
/// concurrently once the polygon's center is known.
#[instrument(skip(state))]
pub async fn get_polygon_weather(
    State(state): State<AppState>,
    Path(polygon_id): Path<String>,
) -> Result<Json<FarmWeatherResponse>, ApiError> {
    let agro = state.agro()?;

    let polygon = agro
        .polygon(&polygon_id)
        .await
        .map_err(ApiError::upstream("Failed to fetch weather data for farm"))?;
    let Some((lat, lon)) = polygon.center_lat_lon() else {
        return Err(ApiError::BadRequest(
            "Polygon center coordinates not available",
        ));
    };

    let (raw, sun) = tokio::try_join!(
        agro.current_weather(lat, lon),
        state.sun.sun_times(lat, lon)
    )
    .map_err(ApiError::upstream("Failed to fetch weather data for farm"))?;

    let weather_data =
        normalize::farm_weather(&polygon, &raw, sun, Coordinate { lat, lon }, Utc::now());
    let message = format!("Weather conditions for farm \"{}\"", polygon.name);

    info!(polygon_id = %polygon_id, temp = weather_data.weather.temp, "Farm weather served");
    Ok(Json(FarmWeatherResponse {
        success: true,
        weather_data,
        message,
    }))
}

/// GET /api/polygon-ndvi/:polygon_id - NDVI history for a farm.
///
/// Defaults to the last 90 days. History and polygon info are independent
/// calls and run concurrently.
#[instrument(skip(state))]
pub async fn get_polygon_ndvi(
    State(state): State<AppState>,
    Path(polygon_id): Path<String>,
    Query(query): Query<NdviRangeQuery>,
) -> Result<Json<NdviResponse>, ApiError> {
    let agro = state.agro()?;

    let now = Utc::now().timestamp();
    let start = query
        .start
        .unwrap_or(now - NDVI_DEFAULT_RANGE_DAYS * 24 * 3600);
    let end = query.end.unwrap_or(now);

    let (history, polygon) = tokio::try_join!(
        agro.ndvi_history(&polygon_id, start, end),
        agro.polygon(&polygon_id)
    )
    .map_err(ApiError::upstream("Failed to fetch NDVI data"))?;

    let ndvi_data = normalize::ndvi_records(history);
    info!(
        polygon_id = %polygon_id,
        records = ndvi_data.len(),
        "NDVI history served"
    );
    Ok(Json(NdviResponse {
        success: true,
        polygon_info: PolygonInfo {
            id: polygon.id,
            name: polygon.name,
            area_hectares: normalize::area_hectares(polygon.area),
        },
        total_records: ndvi_data.len(),
        ndvi_data,
    }))
}

/// GET /api/farm-dashboard/:polygon_id - The composite farm view.
#[instrument(skip(state))]
pub async fn get_farm_dashboard(
    State(state): State<AppState>,
    Path(polygon_id): Path<String>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let agro = state.agro()?;

    let dashboard = build_farm_dashboard(agro, &polygon_id, Utc::now())
        .await
        .map_err(ApiError::upstream("Failed to build farm dashboard"))?;

    info!(
        polygon_id = %polygon_id,
        health = ?dashboard.crop_health.health_status,
        "Farm dashboard composed"
    );
    Ok(Json(DashboardResponse {
        success: true,
        dashboard,
    }))
}

/// GET /api/health - Static capability listing.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "message": "Smart Agriculture Dashboard API",
        "endpoints": {
            "location": [
                "GET /api/weather - Location-based weather",
                "GET /api/forecast - Location-based forecast",
                "GET /api/location - Location name lookup",
                "GET /api/agro-data - Agronomic weather passthrough"
            ],
            "farm": [
                "POST /api/polygons - Create farm boundary",
                "GET /api/polygons - List all farms",
                "GET /api/soil/:polygonId - Soil data for farm",
                "GET /api/polygon-weather/:polygonId - Weather for farm",
                "GET /api/polygon-ndvi/:polygonId - NDVI data for farm",
                "GET /api/farm-dashboard/:polygonId - Complete farm dashboard"
            ]
        },
        "default_location": "Trichy, Tamil Nadu (10.7905, 78.7047)"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[[f64; 2]]) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [points],
            },
        })
    }

    #[test]
    fn test_validate_ring_in_range() {
        let geo_json = ring(&[
            [78.704, 10.791],
            [78.705, 10.790],
            [78.7045, 10.789],
            [78.704, 10.791],
        ]);

        assert!(validate_ring_coordinates(&geo_json).is_ok());
    }

    #[test]
    fn test_validate_ring_rejects_bad_latitude() {
        let geo_json = ring(&[[78.704, 95.0], [78.705, 10.790], [78.704, 95.0]]);

        assert!(validate_ring_coordinates(&geo_json).is_err());
    }

    #[test]
    fn test_validate_ring_rejects_bad_longitude() {
        let geo_json = ring(&[[190.0, 10.791], [78.705, 10.790], [190.0, 10.791]]);

        assert!(validate_ring_coordinates(&geo_json).is_err());
    }

    #[test]
    fn test_validate_ring_ignores_shapeless_geojson() {
        // Shape validation belongs to the polygon provider.
        assert!(validate_ring_coordinates(&json!({"type": "Feature"})).is_ok());
    }
}
