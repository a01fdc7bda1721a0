//! Command-line interface for the booking dashboard
//!
//! This module handles argument parsing with clap and the plain-text
//! rendering of fetched results. Rendering is deliberately dumb: it
//! consumes settled values from the data layer and never fetches or
//! retries on its own.

use std::collections::HashMap;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::{BookingPage, Units, WeatherSnapshot};

/// Line printed for a page with no matching bookings
pub const NO_RESULTS: &str = "No se encontraron reservas.";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified unit system is not recognized
    #[error("Invalid units: '{0}'. Valid units: metric, imperial")]
    InvalidUnits(String),
}

/// Travel bookings dashboard - bookings, destination weather, AI notes
#[derive(Parser, Debug)]
#[command(name = "reservas")]
#[command(about = "Travel bookings with destination weather and AI assistance notes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search bookings and print one page of results
    Bookings {
        /// Filter by passenger name
        #[arg(long)]
        pasajero: Option<String>,
        /// Filter by booking code
        #[arg(long)]
        reserva: Option<String>,
        /// Page number to fetch
        #[arg(long)]
        page: Option<u32>,
        /// Results per page
        #[arg(long = "page-size")]
        page_size: Option<u32>,
        /// Also fetch current weather for each destination
        #[arg(long)]
        weather: bool,
    },
    /// Show current weather for a city
    Weather {
        /// Destination city name
        city: String,
        /// Measurement system (metric or imperial)
        #[arg(long)]
        units: Option<String>,
        /// Response language code
        #[arg(long)]
        lang: Option<String>,
    },
    /// Generate an AI assistance note for a booking
    Insight {
        /// Booking code to look up
        #[arg(long)]
        reserva: String,
    },
}

/// Parses a unit-system string argument from the CLI
pub fn parse_units_arg(s: &str) -> Result<Units, CliError> {
    Units::parse(s).ok_or_else(|| CliError::InvalidUnits(s.to_string()))
}

/// Renders one page of bookings as a plain-text table
///
/// `weather` adds a climate column when present; destinations missing
/// from the map (failed or skipped lookups) render as a dash. An empty
/// page is an explicit no-results line, never an error.
pub fn render_bookings_page(
    page: &BookingPage,
    weather: Option<&HashMap<String, WeatherSnapshot>>,
) -> String {
    if page.resultados.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut lines = Vec::with_capacity(page.resultados.len() + 2);

    let header = format!(
        "{:<12} {:<20} {:<16} {:<12} {:<12}",
        "RESERVA", "PASAJERO", "DESTINO", "ESTADO", "REGRESO"
    );
    lines.push(match weather {
        Some(_) => format!("{header} CLIMA"),
        None => header,
    });

    for booking in &page.resultados {
        let row = format!(
            "{:<12} {:<20} {:<16} {:<12} {:<12}",
            booking.reserva,
            booking.pasajero,
            booking.destino,
            booking.estado.to_string(),
            format_fecha(&booking.fecha_regreso),
        );
        lines.push(match weather {
            Some(map) => {
                let cell = map
                    .get(&booking.destino)
                    .map(render_weather_cell)
                    .unwrap_or_else(|| "-".to_string());
                format!("{row} {cell}")
            }
            None => row,
        });
    }

    lines.push(format!(
        "Página {} · {} de {} reservas",
        page.page,
        page.resultados.len(),
        page.total
    ));
    lines.join("\n")
}

/// Renders a standalone weather snapshot
pub fn render_weather(snapshot: &WeatherSnapshot) -> String {
    if snapshot.description.is_empty() {
        format!("{}: {:.1}°C", snapshot.city, snapshot.temp)
    } else {
        format!("{}: {:.1}°C, {}", snapshot.city, snapshot.temp, snapshot.description)
    }
}

/// Compact climate cell for the bookings table
fn render_weather_cell(snapshot: &WeatherSnapshot) -> String {
    if snapshot.description.is_empty() {
        format!("{:.1}°C", snapshot.temp)
    } else {
        format!("{:.1}°C {}", snapshot.temp, snapshot.description)
    }
}

/// Reformats a server `YYYY-MM-DD` return date for display
///
/// Unparseable values are shown as received; the server owns the format.
pub fn format_fecha(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
