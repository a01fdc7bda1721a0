//! Destination weather endpoint client
//!
//! Fetches current weather for a city and flattens the provider's nested
//! response into a [`WeatherSnapshot`].

use std::sync::Arc;

use serde::Deserialize;

use crate::data::WeatherSnapshot;
use crate::transport::{ApiError, ApiRequest, Transport};

/// Header carrying the static weather credential
const AUTH_HEADER: &str = "X-System-Auth-Key";

/// Measurement system for temperatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Query-string value for this unit system
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Parses a unit name, e.g. from a CLI argument
    pub fn parse(s: &str) -> Option<Units> {
        match s {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            _ => None,
        }
    }
}

/// Parameters for a weather lookup
///
/// `units` and `lang` fall back to `metric` / `es` and are always present
/// in the outgoing query string.
#[derive(Debug, Clone, Default)]
pub struct WeatherParams {
    /// Destination city; the cache key for the resulting snapshot
    pub city: String,
    pub units: Option<Units>,
    pub lang: Option<String>,
}

impl WeatherParams {
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            ..Default::default()
        }
    }
}

/// Client for the weather endpoint
#[derive(Clone)]
pub struct WeatherClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    auth_key: String,
}

impl WeatherClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        auth_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            auth_key: auth_key.into(),
        }
    }

    /// Fetches the current weather for `params.city`
    pub async fn fetch(&self, params: &WeatherParams) -> Result<WeatherSnapshot, ApiError> {
        let units = params.units.unwrap_or_default();
        let lang = params.lang.as_deref().unwrap_or("es");

        let request = ApiRequest::get(&self.base_url)
            .query("city", &params.city)
            .query("units", units.as_query())
            .query("lang", lang)
            .header(AUTH_HEADER, &self.auth_key);

        let response = self
            .transport
            .send(request)
            .await?
            .ensure_success("weather")?;
        parse_snapshot(&response.body)
    }
}

/// Weather endpoint response envelope
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    data: WeatherData,
}

#[derive(Debug, Deserialize)]
struct WeatherData {
    temperature: f64,
    #[serde(default)]
    weather: Option<WeatherFields>,
    city: String,
}

/// Conditions block; the detailed `description` is preferred over the
/// coarser `main`, and both may be absent.
#[derive(Debug, Deserialize)]
struct WeatherFields {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    main: Option<String>,
}

fn parse_snapshot(body: &str) -> Result<WeatherSnapshot, ApiError> {
    let parsed: WeatherResponse = serde_json::from_str(body).map_err(|source| ApiError::Parse {
        endpoint: "weather",
        source,
    })?;

    let data = parsed.data;
    let description = data
        .weather
        .and_then(|w| w.description.or(w.main))
        .unwrap_or_default();

    Ok(WeatherSnapshot {
        temp: data.temperature,
        description,
        city: data.city,
    })
}
