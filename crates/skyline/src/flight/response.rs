//! Upstream flight-data response shapes.
//!
//! The API answers with a list of flight legs, an object wrapping that list,
//! or a single leg, and time fields come either as flat strings or as
//! `{ local, utc }` objects. Everything here is optional and validated at
//! the boundary; [`FlightRecord::times`] applies the fallback order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::time::to_hhmm;
use crate::error::{Error, Result};

/// Flight times extracted from an upstream record, each rendered `HH:MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightTimes {
    /// Scheduled departure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// Scheduled arrival.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    /// Actual departure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_actual: Option<String>,
    /// Actual arrival.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_actual: Option<String>,
    /// Upstream status text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// The accepted top-level shapes, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlightResponse {
    /// `[ {...}, ... ]`
    List(Vec<FlightRecord>),
    /// `{ "flights": [ {...}, ... ] }`
    Wrapped {
        /// The wrapped legs.
        flights: Vec<FlightRecord>,
    },
    /// `{...}`
    Single(Box<FlightRecord>),
}

impl FlightResponse {
    /// Interpret a parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns `NoData` for `null` and `Upstream` if the body matches none of
    /// the accepted shapes.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(Error::NoData);
        }
        serde_json::from_value(value).map_err(|_| Error::upstream("Invalid AeroDataBox response"))
    }

    /// The first flight record, if any.
    #[must_use]
    pub fn first(self) -> Option<FlightRecord> {
        match self {
            Self::List(flights) | Self::Wrapped { flights } => flights.into_iter().next(),
            Self::Single(record) => Some(*record),
        }
    }
}

/// One flight leg. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightRecord {
    /// Departure movement.
    pub departure: Option<Movement>,
    /// Arrival movement.
    pub arrival: Option<Movement>,
    /// Status text.
    pub status: Option<String>,
    /// Alternate status field.
    pub flight_status: Option<String>,
}

/// Departure or arrival details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Movement {
    /// Scheduled time, local.
    pub scheduled_time_local: Option<TimeField>,
    /// Scheduled time, generic or `{local, utc}`.
    pub scheduled_time: Option<TimeField>,
    /// Scheduled time, UTC.
    pub scheduled_time_utc: Option<TimeField>,
    /// Actual time, local.
    pub actual_time_local: Option<TimeField>,
    /// Actual time, generic or `{local, utc}`.
    pub actual_time: Option<TimeField>,
    /// Actual time, UTC.
    pub actual_time_utc: Option<TimeField>,
}

/// A time value as the API may send it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeField {
    /// A timestamp string.
    Text(String),
    /// A `{ "local": ..., "utc": ... }` pair.
    Split {
        /// Local timestamp.
        #[serde(default)]
        local: Option<String>,
        /// UTC timestamp.
        #[serde(default)]
        utc: Option<String>,
    },
    /// Anything else; treated as absent.
    Other(Value),
}

impl TimeField {
    /// The timestamp text this field carries, preferring local over UTC.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => non_empty(s),
            Self::Split { local, utc } => local
                .as_deref()
                .and_then(non_empty)
                .or_else(|| utc.as_deref().and_then(non_empty)),
            Self::Other(_) => None,
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// First present candidate, rendered `HH:MM`. A present candidate that does
/// not parse ends the search.
fn pick(candidates: [Option<&TimeField>; 3]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find_map(TimeField::text)
        .and_then(to_hhmm)
}

impl Movement {
    fn scheduled(&self) -> Option<String> {
        pick([
            self.scheduled_time_local.as_ref(),
            self.scheduled_time.as_ref(),
            self.scheduled_time_utc.as_ref(),
        ])
    }

    fn actual(&self) -> Option<String> {
        pick([
            self.actual_time_local.as_ref(),
            self.actual_time.as_ref(),
            self.actual_time_utc.as_ref(),
        ])
    }
}

impl FlightRecord {
    /// Extract the flight times with local → generic → UTC fallback.
    #[must_use]
    pub fn times(&self) -> FlightTimes {
        FlightTimes {
            departure_time: self.departure.as_ref().and_then(Movement::scheduled),
            arrival_time: self.arrival.as_ref().and_then(Movement::scheduled),
            departure_actual: self.departure.as_ref().and_then(Movement::actual),
            arrival_actual: self.arrival.as_ref().and_then(Movement::actual),
            status: self
                .status
                .as_deref()
                .and_then(non_empty)
                .or_else(|| self.flight_status.as_deref().and_then(non_empty))
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first_times(body: Value) -> Result<FlightTimes> {
        FlightResponse::from_value(body)?
            .first()
            .map(|record| record.times())
            .ok_or(Error::NoData)
    }

    #[test]
    fn test_single_object_scheduled_local() {
        let times = first_times(json!({
            "departure": {"scheduledTimeLocal": "2024-01-01T10:30:00"}
        }))
        .unwrap();
        assert_eq!(times.departure_time.as_deref(), Some("10:30"));
        assert!(times.arrival_time.is_none());
        assert!(times.status.is_none());
    }

    #[test]
    fn test_list_takes_first() {
        let times = first_times(json!([
            {"arrival": {"scheduledTimeLocal": "2024-01-01T12:45"}, "status": "Expected"},
            {"arrival": {"scheduledTimeLocal": "2024-01-01T18:00"}}
        ]))
        .unwrap();
        assert_eq!(times.arrival_time.as_deref(), Some("12:45"));
        assert_eq!(times.status.as_deref(), Some("Expected"));
    }

    #[test]
    fn test_wrapped_flights() {
        let times = first_times(json!({
            "flights": [{"departure": {"actualTimeLocal": "2024-01-01T06:02:00"}}]
        }))
        .unwrap();
        assert_eq!(times.departure_actual.as_deref(), Some("06:02"));
    }

    #[test]
    fn test_fallback_order_prefers_local() {
        let times = first_times(json!({
            "departure": {
                "scheduledTimeUtc": "2024-01-01T01:00:00",
                "scheduledTime": "2024-01-01T02:00:00",
                "scheduledTimeLocal": "2024-01-01T03:00:00"
            }
        }))
        .unwrap();
        assert_eq!(times.departure_time.as_deref(), Some("03:00"));
    }

    #[test]
    fn test_fallback_skips_empty_strings() {
        let times = first_times(json!({
            "arrival": {"actualTimeLocal": "", "actualTime": "2024-01-01T08:15:00"}
        }))
        .unwrap();
        assert_eq!(times.arrival_actual.as_deref(), Some("08:15"));
    }

    #[test]
    fn test_unparsable_winner_is_omitted() {
        let times = first_times(json!({
            "departure": {"scheduledTimeLocal": "garbage", "scheduledTime": "2024-01-01T02:00:00"}
        }))
        .unwrap();
        assert!(times.departure_time.is_none());
    }

    #[test]
    fn test_split_time_object() {
        let times = first_times(json!({
            "departure": {"scheduledTime": {"local": "2024-01-01 10:30", "utc": "2024-01-01 09:30Z"}}
        }))
        .unwrap();
        assert_eq!(times.departure_time.as_deref(), Some("10:30"));
    }

    #[test]
    fn test_odd_time_value_is_ignored() {
        let times = first_times(json!({
            "departure": {"scheduledTimeLocal": 42, "scheduledTime": "2024-01-01T11:11:00"}
        }))
        .unwrap();
        assert_eq!(times.departure_time.as_deref(), Some("11:11"));
    }

    #[test]
    fn test_status_falls_back_to_flight_status() {
        let times = first_times(json!({"status": "", "flightStatus": "Departed"})).unwrap();
        assert_eq!(times.status.as_deref(), Some("Departed"));
    }

    #[test]
    fn test_empty_object_yields_empty_times() {
        let times = first_times(json!({})).unwrap();
        assert_eq!(times, FlightTimes::default());
    }

    #[test]
    fn test_no_data() {
        assert!(matches!(first_times(json!([])), Err(Error::NoData)));
        assert!(matches!(first_times(json!({"flights": []})), Err(Error::NoData)));
        assert!(matches!(first_times(Value::Null), Err(Error::NoData)));
    }

    #[test]
    fn test_unexpected_shape_is_upstream_error() {
        assert!(matches!(first_times(json!(17)), Err(Error::Upstream(_))));
        assert!(matches!(first_times(json!("text")), Err(Error::Upstream(_))));
    }

    #[test]
    fn test_flight_times_serialization_omits_missing() {
        let times = FlightTimes {
            departure_time: Some("10:30".to_string()),
            ..FlightTimes::default()
        };
        assert_eq!(
            serde_json::to_value(&times).unwrap(),
            json!({"departureTime": "10:30"})
        );
    }
}
