//! Core data models for the travel booking dashboard
//!
//! This module contains the domain types shared across the endpoint
//! clients, the query cache, and the CLI.

pub mod bookings;
pub mod insight;
pub mod weather;

pub use bookings::{BookingFilter, BookingsClient};
pub use insight::{ClimaInfo, InsightClient, InsightParams};
pub use weather::{Units, WeatherClient, WeatherParams};

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single travel booking as returned by the bookings endpoint
///
/// Immutable once fetched; owned by the page of results it was loaded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Opaque booking code, unique across the system
    pub reserva: String,
    /// Passenger name
    pub pasajero: String,
    /// Destination city name, also the weather lookup key
    pub destino: String,
    /// Current booking state
    pub estado: BookingStatus,
    /// Return date as formatted by the server
    pub fecha_regreso: String,
}

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Activa,
    Cancelada,
    Finalizada,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Activa => "activa",
            BookingStatus::Cancelada => "cancelada",
            BookingStatus::Finalizada => "finalizada",
        };
        write!(f, "{name}")
    }
}

/// One page of booking search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPage {
    /// Server-side match count across all pages, not just this one
    pub total: u32,
    /// Page number this response covers
    pub page: u32,
    /// Requested page size; `resultados` never exceeds it
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    /// Bookings on this page, in server order
    pub resultados: Vec<Booking>,
}

/// Current weather at a destination
///
/// Cached under the exact city string that was requested (case-sensitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in the requested units (°C with the metric default)
    pub temp: f64,
    /// Free-text conditions, possibly empty when the provider sends none
    pub description: String,
    /// City name as reported by the provider
    pub city: String,
}

/// Advisory text generated for one booking/weather pairing
///
/// Never cached; each generation is a fresh mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub insight: String,
}
