//! Runtime configuration
//!
//! Endpoints and credentials come from environment variables (a `.env`
//! file is honored), with the deployed backend's endpoints as defaults.
//! Credentials are attached to outgoing requests and not otherwise
//! managed; a missing key simply means the endpoint rejects the call.

use std::env;

/// Deployed bookings search endpoint
const DEFAULT_BOOKINGS_URL: &str =
    "https://3ccfrjulc8.execute-api.us-west-1.amazonaws.com/dev/reservasHandler";

/// Deployed weather endpoint
const DEFAULT_WEATHER_URL: &str = "http://api.assist-365.com/api/weather/current";

/// Generative-text endpoint used for assistance notes
const DEFAULT_INSIGHT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Endpoints and credentials for the three upstream services
#[derive(Debug, Clone)]
pub struct Config {
    pub bookings_url: String,
    pub weather_url: String,
    /// Static credential sent in the weather request header
    pub weather_auth_key: String,
    pub insight_url: String,
    /// Static credential appended to the insight URL
    pub insight_api_key: String,
}

impl Config {
    /// Reads configuration from the environment
    pub fn from_env() -> Self {
        Self {
            bookings_url: env::var("RESERVAS_BOOKINGS_URL")
                .unwrap_or_else(|_| DEFAULT_BOOKINGS_URL.to_string()),
            weather_url: env::var("RESERVAS_WEATHER_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_string()),
            weather_auth_key: env::var("WEATHER_AUTH_KEY").unwrap_or_default(),
            insight_url: env::var("RESERVAS_INSIGHT_URL")
                .unwrap_or_else(|_| DEFAULT_INSIGHT_URL.to_string()),
            insight_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookings_url: DEFAULT_BOOKINGS_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            weather_auth_key: String::new(),
            insight_url: DEFAULT_INSIGHT_URL.to_string(),
            insight_api_key: String::new(),
        }
    }
}
