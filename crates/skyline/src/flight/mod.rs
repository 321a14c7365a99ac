//! Flight-time lookup against a third-party flight-data API.
//!
//! [`FlightLookup`] validates the designator and date locally, asks a
//! [`FlightDataSource`] for the raw response, and extracts [`FlightTimes`]
//! from the first flight record it contains.

mod client;
mod designator;
mod response;
mod time;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::FlightApiConfig;
use crate::error::{Error, Result};

pub use client::AeroDataBoxClient;
pub use designator::FlightDesignator;
pub use response::{FlightRecord, FlightResponse, FlightTimes, Movement, TimeField};
pub use time::{normalize_date, to_hhmm, Timestamp};

/// Source of raw flight-data responses.
#[async_trait]
pub trait FlightDataSource: Send + Sync {
    /// Fetch the upstream JSON for one flight on one day (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns `Upstream` on transport failure, non-success status, or a body
    /// that is not JSON.
    async fn fetch(&self, designator: &FlightDesignator, date: &str) -> Result<Value>;
}

/// Flight-time lookup over a data source.
#[derive(Debug, Clone)]
pub struct FlightLookup<S> {
    source: S,
}

impl FlightLookup<AeroDataBoxClient> {
    /// Build a lookup against the configured `AeroDataBox` API.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if no API key is configured.
    pub fn from_config(config: &FlightApiConfig) -> Result<Self> {
        AeroDataBoxClient::from_config(config).map(Self::new)
    }
}

impl<S: FlightDataSource> FlightLookup<S> {
    /// Wrap a data source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Look up scheduled and actual times for a flight.
    ///
    /// `flight` is free-form (`"LH 400"`, `"lh0400"`); `date` is a date or
    /// timestamp. The designator is validated before any request is made.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed designator, `Upstream` when the
    /// source fails or the response has an unexpected shape, and `NoData`
    /// when the response holds no flight.
    pub async fn flight_times(&self, flight: &str, date: &str) -> Result<FlightTimes> {
        let designator = FlightDesignator::parse(flight)?;
        let date = normalize_date(date);
        debug!(flight = %designator, %date, "looking up flight times");

        let body = self.source.fetch(&designator, &date).await?;
        let record = FlightResponse::from_value(body)?
            .first()
            .ok_or(Error::NoData)?;

        let times = record.times();
        info!(flight = %designator, %date, "flight times resolved");
        Ok(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns a canned body and records every request.
    struct CannedSource {
        body: Result<Value>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl CannedSource {
        fn ok(body: Value) -> Self {
            Self {
                body: Ok(body),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                body: Err(err),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FlightDataSource for CannedSource {
        async fn fetch(&self, designator: &FlightDesignator, date: &str) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((designator.code(), date.to_string()));
            match &self.body {
                Ok(value) => Ok(value.clone()),
                Err(e) => Err(Error::upstream(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_flight_times_departure_local() {
        let lookup = FlightLookup::new(CannedSource::ok(json!({
            "departure": {"scheduledTimeLocal": "2024-01-01T10:30:00"}
        })));

        let times = lookup.flight_times("LH 400", "2024-01-01").await.unwrap();

        assert_eq!(times.departure_time.as_deref(), Some("10:30"));
        assert_eq!(
            lookup.source.calls(),
            vec![("LH400".to_string(), "2024-01-01".to_string())]
        );
    }

    #[tokio::test]
    async fn test_invalid_designator_makes_no_request() {
        let lookup = FlightLookup::new(CannedSource::ok(json!({})));

        let err = lookup.flight_times("123", "2024-01-01").await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(lookup.source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_date_is_normalized_before_request() {
        let lookup = FlightLookup::new(CannedSource::ok(json!([{}])));

        lookup
            .flight_times("os 12", "2024-06-30T22:00:00")
            .await
            .unwrap();

        assert_eq!(
            lookup.source.calls(),
            vec![("OS12".to_string(), "2024-06-30".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_no_data() {
        let lookup = FlightLookup::new(CannedSource::ok(json!([])));
        let err = lookup.flight_times("LH400", "2024-01-01").await.unwrap_err();
        assert!(matches!(err, Error::NoData));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let lookup = FlightLookup::new(CannedSource::failing(Error::upstream(
            "AeroDataBox error 429",
        )));
        let err = lookup.flight_times("LH400", "2024-01-01").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_from_config_without_key() {
        let err = FlightLookup::from_config(&FlightApiConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
