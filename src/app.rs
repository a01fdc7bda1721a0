//! Application wiring for the dashboard
//!
//! `App` owns the endpoint clients, the query caches, and the insight
//! mutation runner, and exposes the fetch surface the CLI renders. The
//! caches are plain fields constructed here at startup; nothing is
//! process-global.

use std::sync::Arc;

use tokio::time::Duration;

use crate::cache::{EntryView, MutationRunner, MutationView, QueryCache};
use crate::config::Config;
use crate::data::{
    BookingFilter, BookingPage, BookingsClient, InsightClient, InsightParams, InsightResult,
    WeatherClient, WeatherParams, WeatherSnapshot,
};
use crate::transport::{ApiError, HttpTransport, Transport};

/// Freshness window for weather entries
const WEATHER_FRESH_FOR: Duration = Duration::from_secs(10 * 60);

/// Owns the data-access layer for one dashboard session
pub struct App {
    bookings_client: BookingsClient,
    weather_client: WeatherClient,
    insight_client: InsightClient,
    /// One entry per distinct filter; a fetched page never goes stale
    bookings_cache: QueryCache<BookingFilter, BookingPage>,
    /// One entry per requested city, fresh for ten minutes
    weather_cache: QueryCache<String, WeatherSnapshot>,
    insight_runner: MutationRunner<InsightResult>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new()), config)
    }

    /// Wires the app over a specific transport (injected in tests)
    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            bookings_client: BookingsClient::new(transport.clone(), &config.bookings_url),
            weather_client: WeatherClient::new(
                transport.clone(),
                &config.weather_url,
                &config.weather_auth_key,
            ),
            insight_client: InsightClient::new(
                transport,
                &config.insight_url,
                &config.insight_api_key,
            ),
            bookings_cache: QueryCache::new(None),
            weather_cache: QueryCache::new(Some(WEATHER_FRESH_FOR)),
            insight_runner: MutationRunner::new(),
        }
    }

    /// Fetches one page of bookings through the cache
    ///
    /// Each distinct filter is its own cache entry; repeating a filter
    /// reuses the stored page without a second request.
    pub async fn fetch_bookings(&self, filter: BookingFilter) -> EntryView<BookingPage> {
        let client = self.bookings_client.clone();
        self.bookings_cache
            .get_or_fetch(Some(filter), true, move |filter| async move {
                client.fetch(&filter).await
            })
            .await
    }

    /// Fetches destination weather through the cache, keyed by city
    ///
    /// An empty city disables the lookup: the view stays idle and no
    /// request is issued.
    pub async fn fetch_weather(&self, params: WeatherParams) -> EntryView<WeatherSnapshot> {
        let enabled = !params.city.is_empty();
        let key = params.city.clone();
        let client = self.weather_client.clone();
        self.weather_cache
            .get_or_fetch(Some(key), enabled, move |_city| async move {
                client.fetch(&params).await
            })
            .await
    }

    /// Generates an advisory note for one booking; never cached
    pub async fn run_insight(&self, params: InsightParams) -> Result<InsightResult, Arc<ApiError>> {
        let client = self.insight_client.clone();
        self.insight_runner
            .invoke(move || async move { client.fetch(&params).await })
            .await
    }

    /// Lifecycle of the most recent insight invocation
    pub fn insight_status(&self) -> MutationView<InsightResult> {
        self.insight_runner.snapshot()
    }

    /// Drops settled cache entries older than `max_age` from both caches
    pub fn purge_caches(&self, max_age: Duration) -> usize {
        self.bookings_cache.purge_older_than(max_age) + self.weather_cache.purge_older_than(max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MutationStatus;
    use crate::transport::testing::MockTransport;

    const BOOKINGS_RESPONSE: &str = r#"{
        "total": 1,
        "page": 1,
        "pageSize": 10,
        "resultados": [{
            "reserva": "RSV-001",
            "pasajero": "Ana García",
            "destino": "Madrid",
            "estado": "activa",
            "fecha_regreso": "2025-09-01"
        }]
    }"#;

    const WEATHER_RESPONSE: &str = r#"{
        "data": {
            "temperature": 24.5,
            "weather": { "description": "cielo despejado" },
            "city": "Madrid"
        }
    }"#;

    const INSIGHT_RESPONSE: &str = r#"{
        "candidates": [{
            "content": { "parts": [{ "text": "Todo en orden con la reserva." }] }
        }]
    }"#;

    fn app(mock: &Arc<MockTransport>) -> App {
        App::with_transport(mock.clone(), &Config::default())
    }

    #[tokio::test]
    async fn test_fetch_bookings_caches_by_filter() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(BOOKINGS_RESPONSE);

        let app = app(&mock);
        let filter = BookingFilter {
            pasajero: Some("Ana".to_string()),
            ..Default::default()
        };

        let first = app.fetch_bookings(filter.clone()).await;
        let second = app.fetch_bookings(filter).await;

        assert_eq!(mock.request_count(), 1);
        assert_eq!(first.data.expect("page").resultados.len(), 1);
        assert_eq!(second.data.expect("cached page").total, 1);
    }

    #[tokio::test]
    async fn test_fetch_weather_with_empty_city_is_idle() {
        let mock = Arc::new(MockTransport::new());
        let app = app(&mock);

        let view = app.fetch_weather(WeatherParams::default()).await;

        assert_eq!(mock.request_count(), 0);
        assert!(view.data.is_none() && view.error.is_none() && !view.is_loading);
    }

    #[tokio::test]
    async fn test_fetch_weather_dedups_same_city() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(WEATHER_RESPONSE);

        let app = app(&mock);
        let (a, b) = tokio::join!(
            app.fetch_weather(WeatherParams::for_city("Madrid")),
            app.fetch_weather(WeatherParams::for_city("Madrid")),
        );

        assert_eq!(mock.request_count(), 1);
        let a = a.data.expect("first caller sees the snapshot");
        let b = b.data.expect("second caller sees the snapshot");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_run_insight_tracks_lifecycle() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(INSIGHT_RESPONSE);

        let app = app(&mock);
        assert_eq!(app.insight_status().status, MutationStatus::Idle);

        let params = InsightParams {
            pasajero: "Ana García".to_string(),
            destino: "Madrid".to_string(),
            fecha_regreso: "2025-09-01".to_string(),
            estado: crate::data::BookingStatus::Activa,
            clima: None,
        };
        let result = app.run_insight(params).await.expect("insight generated");

        assert_eq!(result.insight, "Todo en orden con la reserva.");
        let view = app.insight_status();
        assert_eq!(view.status, MutationStatus::Success);
        assert_eq!(view.data.expect("result retained").insight, result.insight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_caches_reaps_old_entries_from_both_caches() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(BOOKINGS_RESPONSE);
        mock.push_ok(WEATHER_RESPONSE);

        let app = app(&mock);
        app.fetch_bookings(BookingFilter::default()).await;
        app.fetch_weather(WeatherParams::for_city("Madrid")).await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        let removed = app.purge_caches(Duration::from_secs(1800));
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_failures_stay_scoped_to_their_entry() {
        let mock = Arc::new(MockTransport::new());
        mock.push_status(500, "");
        mock.push_ok(WEATHER_RESPONSE);

        let app = app(&mock);
        let failed = app.fetch_weather(WeatherParams::for_city("Lima")).await;
        let ok = app.fetch_weather(WeatherParams::for_city("Madrid")).await;

        assert!(failed.error.is_some());
        assert_eq!(ok.data.expect("other entry unaffected").city, "Madrid");
    }
}
