//! Environment configuration.
//!
//! Read once at startup and passed explicitly into state construction;
//! handlers never touch the environment. Missing API keys do not prevent
//! startup — the endpoints that need them fail per request instead, which
//! keeps the rest of the surface usable.

use std::env;

/// Default listen port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key for the general weather provider (`OPENWEATHER_API_KEY`).
    pub openweather_api_key: Option<String>,

    /// Key for the agro-monitoring provider (`AGRO_API_KEY`).
    pub agro_api_key: Option<String>,

    /// Key for the reverse-geocoding provider (`OPENCAGE_API_KEY`).
    pub geocoding_api_key: Option<String>,

    /// Listen port (`PORT`).
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            openweather_api_key: env_key("OPENWEATHER_API_KEY"),
            agro_api_key: env_key("AGRO_API_KEY"),
            geocoding_api_key: env_key("OPENCAGE_API_KEY"),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// An empty key counts as unset.
fn env_key(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
