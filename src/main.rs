//! Agridash - aggregation backend for a smart-agriculture farm dashboard.
//!
//! # API Endpoints
//!
//! - `GET /api/weather` - Current weather for a coordinate
//! - `GET /api/forecast` - 3-hour-interval forecast
//! - `GET /api/location` - Reverse-geocoded place name
//! - `GET /api/agro-data` - Agronomic weather passthrough
//! - `POST /api/polygons` / `GET /api/polygons` - Farm boundaries
//! - `GET /api/soil/:polygonId` - Soil conditions
//! - `GET /api/polygon-weather/:polygonId` - Weather at a farm
//! - `GET /api/polygon-ndvi/:polygonId` - NDVI history
//! - `GET /api/farm-dashboard/:polygonId` - Composite farm view
//! - `GET /api/health` - Capability listing

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use agridash::api::{self, AppState};
use agridash::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("agridash=info".parse()?))
        .init();

    // Load configuration from environment
    let config = Config::from_env();
    info!(port = config.port, "Starting Agridash server");

    // Keys are optional at startup; the endpoints that need a missing key
    // answer 500 per request instead.
    if config.openweather_api_key.is_none() {
        warn!("OPENWEATHER_API_KEY not set; weather and forecast endpoints will fail");
    }
    if config.agro_api_key.is_none() {
        warn!("AGRO_API_KEY not set; farm and agro-data endpoints will fail");
    }
    if config.geocoding_api_key.is_none() {
        warn!("OPENCAGE_API_KEY not set; location names fall back to the default");
    }

    // Build router. The dashboard UI is served from its own origin, hence
    // the permissive CORS layer.
    let state = AppState::from_config(&config);
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Agridash is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
