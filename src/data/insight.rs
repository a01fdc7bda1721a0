//! Generative assistance-note endpoint client
//!
//! Builds the advisory prompt for one booking, POSTs it to the
//! generative-text endpoint through the retrying transport, and extracts
//! the first candidate text. A response without a usable candidate
//! degrades to a fixed fallback string instead of failing.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::data::{BookingStatus, InsightResult};
use crate::transport::{ApiError, ApiRequest, RetryingTransport, Transport};

/// Fallback advisory when the provider response carries no candidate text
const FALLBACK_INSIGHT: &str = "No se pudo generar el insight.";

/// Placeholder for the prompt when no weather context is available
const CLIMA_UNAVAILABLE: &str = "información no disponible";

/// Weather context attached to an insight request
#[derive(Debug, Clone)]
pub struct ClimaInfo {
    pub temp: f64,
    pub description: String,
}

/// Inputs for one advisory note
#[derive(Debug, Clone)]
pub struct InsightParams {
    pub pasajero: String,
    pub destino: String,
    pub fecha_regreso: String,
    pub estado: BookingStatus,
    /// Current destination weather, when a snapshot was available
    pub clima: Option<ClimaInfo>,
}

/// Client for the generative-text endpoint
///
/// This is the only client that goes through [`RetryingTransport`]; the
/// provider rate-limits aggressively and a busy period should not surface
/// as an immediate failure.
#[derive(Clone)]
pub struct InsightClient {
    transport: RetryingTransport<Arc<dyn Transport>>,
    base_url: String,
    api_key: String,
}

impl InsightClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport: RetryingTransport::new(transport),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Generates an advisory note for the given booking context
    pub async fn fetch(&self, params: &InsightParams) -> Result<InsightResult, ApiError> {
        let prompt = build_prompt(params);
        let body = json!({
            "contents": [{
                "parts": [{
                    "text": prompt
                }]
            }]
        });

        let request = ApiRequest::post(&self.base_url, body).query("key", &self.api_key);
        let response = self
            .transport
            .send(request)
            .await?
            .ensure_success("insight")?;

        Ok(InsightResult {
            insight: extract_insight(&response.body),
        })
    }
}

/// Renders the Spanish advisory prompt embedding the booking fields
///
/// The temperature is rounded to whole degrees; absent weather becomes a
/// literal "not available" phrase rather than an omitted line.
fn build_prompt(params: &InsightParams) -> String {
    let clima_info = match &params.clima {
        Some(clima) => format!("{:.0}°C, {}", clima.temp, clima.description),
        None => CLIMA_UNAVAILABLE.to_string(),
    };

    format!(
        "Eres un asistente inteligente para agentes de asistencia de viaje. \
         Genera un breve mensaje de asistencia (máximo 2 o 3 oraciones) para \
         ayudar al agente con esta reserva:\n\n\
         - Pasajero: {pasajero}\n\
         - Destino: {destino}\n\
         - Fecha de regreso: {fecha_regreso}\n\
         - Estado de la reserva: {estado}\n\
         - Clima actual en destino: {clima_info}\n\n\
         El mensaje debe ser útil, profesional y sugerir una acción que el \
         agente podría tomar o recomendar al cliente según el clima o la \
         cercanía de la fecha de regreso. Responde solo con el mensaje, sin \
         explicaciones adicionales.",
        pasajero = params.pasajero,
        destino = params.destino,
        fecha_regreso = params.fecha_regreso,
        estado = params.estado,
    )
}

/// Generative endpoint response shape; every level may be missing
#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Pulls the first candidate's first text part, or the fallback string
///
/// Shape mismatches are not errors; the provider occasionally returns
/// empty candidate lists for safety-filtered prompts.
fn extract_insight(body: &str) -> String {
    let parsed: GenerateResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(error) => {
            debug!(%error, "unparseable insight response, using fallback");
            return FALLBACK_INSIGHT.to_string();
        }
    };

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .unwrap_or_else(|| FALLBACK_INSIGHT.to_string())
}
