//! Travel bookings dashboard CLI
//!
//! Looks up travel bookings, augments them with live destination weather,
//! and on demand asks a generative-text service for an assistance note.
//! All fetching goes through the cached data layer in [`reservas::app`];
//! this binary only parses arguments and prints results.

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use reservas::app::App;
use reservas::cli::{self, Cli, Command};
use reservas::config::Config;
use reservas::data::{
    BookingFilter, BookingPage, ClimaInfo, InsightParams, WeatherParams, WeatherSnapshot,
};
use reservas::transport::ApiError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let app = App::new(&config);

    match run(cli.command, &app).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, app: &App) -> Result<String, String> {
    match command {
        Command::Bookings {
            pasajero,
            reserva,
            page,
            page_size,
            weather,
        } => {
            let filter = BookingFilter {
                pasajero,
                reserva,
                page,
                page_size,
            };
            let page = required(app.fetch_bookings(filter).await.into_result())?;

            if weather {
                let by_city = fetch_weather_for(app, &page).await;
                Ok(cli::render_bookings_page(&page, Some(&by_city)))
            } else {
                Ok(cli::render_bookings_page(&page, None))
            }
        }
        Command::Weather { city, units, lang } => {
            let units = match units {
                Some(raw) => Some(cli::parse_units_arg(&raw).map_err(|e| e.to_string())?),
                None => None,
            };
            let params = WeatherParams { city, units, lang };
            let snapshot = required(app.fetch_weather(params).await.into_result())?;
            Ok(cli::render_weather(&snapshot))
        }
        Command::Insight { reserva } => {
            let filter = BookingFilter {
                reserva: Some(reserva.clone()),
                ..Default::default()
            };
            let page = required(app.fetch_bookings(filter).await.into_result())?;
            let Some(booking) = page
                .resultados
                .into_iter()
                .find(|booking| booking.reserva == reserva)
            else {
                return Err(format!("No se encontró la reserva {reserva}."));
            };

            // Weather is best effort here; without a snapshot the prompt
            // carries the "not available" phrase instead.
            let clima = app
                .fetch_weather(WeatherParams::for_city(booking.destino.clone()))
                .await
                .data
                .map(|snapshot| ClimaInfo {
                    temp: snapshot.temp,
                    description: snapshot.description,
                });

            let params = InsightParams {
                pasajero: booking.pasajero,
                destino: booking.destino,
                fecha_regreso: booking.fecha_regreso,
                estado: booking.estado,
                clima,
            };
            let result = app.run_insight(params).await.map_err(|e| e.to_string())?;
            Ok(result.insight)
        }
    }
}

/// Fetches weather for every destination on the page, concurrently
///
/// Repeated destinations share one cache entry, so a page full of the
/// same city costs one request. Failed lookups are simply absent from
/// the returned map; the table renders a dash for them.
async fn fetch_weather_for(app: &App, page: &BookingPage) -> HashMap<String, WeatherSnapshot> {
    let lookups = page
        .resultados
        .iter()
        .map(|booking| app.fetch_weather(WeatherParams::for_city(booking.destino.clone())));
    let views = join_all(lookups).await;

    let mut by_city = HashMap::new();
    for (booking, view) in page.resultados.iter().zip(views) {
        if let Some(snapshot) = view.data {
            by_city.insert(booking.destino.clone(), snapshot);
        }
    }
    by_city
}

/// Unwraps a settled fetch for printing, turning errors into messages
fn required<T>(result: Result<Option<T>, Arc<ApiError>>) -> Result<T, String> {
    match result {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err("La consulta no se realizó.".to_string()),
        Err(error) => Err(error.to_string()),
    }
}
