//! Bookings search endpoint client
//!
//! Builds the filtered GET request for the bookings endpoint and parses
//! the response into a [`BookingPage`]. Caching is the query cache's job;
//! this client is pure request/response.

use std::sync::Arc;

use crate::data::BookingPage;
use crate::transport::{ApiError, ApiRequest, Transport};

/// Search filter for the bookings endpoint
///
/// Doubles as the cache key for one page of results, so distinct filter
/// combinations are distinct cache entries. Absent fields are omitted
/// from the query string entirely, never sent as empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BookingFilter {
    /// Match on passenger name
    pub pasajero: Option<String>,
    /// Match on booking code
    pub reserva: Option<String>,
    /// Page number to fetch
    pub page: Option<u32>,
    /// Results per page
    pub page_size: Option<u32>,
}

/// Client for the bookings search endpoint
#[derive(Clone)]
pub struct BookingsClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl BookingsClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetches one page of bookings matching `filter`
    pub async fn fetch(&self, filter: &BookingFilter) -> Result<BookingPage, ApiError> {
        let mut request = ApiRequest::get(&self.base_url);
        if let Some(pasajero) = &filter.pasajero {
            request = request.query("pasajero", pasajero);
        }
        if let Some(reserva) = &filter.reserva {
            request = request.query("reserva", reserva);
        }
        if let Some(page) = filter.page {
            request = request.query("page", page.to_string());
        }
        if let Some(page_size) = filter.page_size {
            request = request.query("pageSize", page_size.to_string());
        }

        let response = self
            .transport
            .send(request)
            .await?
            .ensure_success("bookings")?;
        parse_page(&response.body)
    }
}

/// Parses a bookings response body, keeping the server's field names
fn parse_page(body: &str) -> Result<BookingPage, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Parse {
        endpoint: "bookings",
        source,
    })
}
