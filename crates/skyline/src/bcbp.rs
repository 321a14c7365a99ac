//! IATA bar coded boarding pass (BCBP) parsing.
//!
//! Reads the mandatory fixed-width fields of the first leg from the text of
//! a decoded `PDF_417` or Aztec symbol:
//!
//! | Columns | Field |
//! |---|---|
//! | 0 | format code, always `M` |
//! | 2..22 | passenger name, `LAST/FIRST` |
//! | 23..30 | booking reference (PNR) |
//! | 30..33 | departure airport |
//! | 33..36 | arrival airport |
//! | 36..39 | operating carrier |
//! | 39..44 | flight number, zero padded |
//! | 44..47 | day of year of the flight |
//! | 48..52 | seat |
//!
//! Conditional and airline-specific sections after column 58 are ignored.

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Shortest string holding every mandatory field.
pub const MIN_LENGTH: usize = 58;

/// Format code of a BCBP string.
const FORMAT_CODE: char = 'M';

/// Passenger section of a boarding pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Name as `FIRST LAST`.
    pub name: Option<String>,
}

/// One end of the flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// IATA airport code.
    pub airport: Option<String>,
    /// Never carried by the barcode; filled by a flight lookup.
    pub datetime: Option<String>,
}

/// Flight section of a boarding pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFlight {
    /// Carrier and number without padding, e.g. `LH400`.
    pub number: Option<String>,
    /// Flight date in the current year.
    pub date: Option<NaiveDate>,
    /// Departure airport.
    pub departure: Endpoint,
    /// Arrival airport.
    pub arrival: Endpoint,
}

/// The fields read from a boarding pass barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardingPass {
    /// Passenger data.
    pub passenger: Passenger,
    /// Flight data.
    pub flight: TicketFlight,
    /// Seat, e.g. `012A`.
    pub seat: Option<String>,
    /// Booking reference.
    pub pnr: Option<String>,
}

impl BoardingPass {
    /// Flight designator and `YYYY-MM-DD` date, ready for a flight lookup.
    #[must_use]
    pub fn lookup_key(&self) -> Option<(String, String)> {
        let number = self.flight.number.clone()?;
        let date = self.flight.date?;
        Some((number, date.format("%Y-%m-%d").to_string()))
    }
}

/// Parse a BCBP string, using the current UTC year for the flight date.
///
/// Returns `None` when the input is shorter than [`MIN_LENGTH`] or does not
/// start with the `M` format code.
#[must_use]
pub fn parse(raw: &str) -> Option<BoardingPass> {
    parse_in_year(raw, Utc::now().year())
}

/// Parse a BCBP string, resolving the day of year against `year`.
#[must_use]
pub fn parse_in_year(raw: &str, year: i32) -> Option<BoardingPass> {
    let chars: Vec<char> = raw.trim().chars().collect();
    if chars.len() < MIN_LENGTH || chars[0] != FORMAT_CODE {
        return None;
    }

    let field = |start: usize, end: usize| -> String {
        chars[start..end].iter().collect::<String>().trim().to_string()
    };
    let non_empty = |value: String| (!value.is_empty()).then_some(value);

    let carrier = field(36, 39);
    let padded_number = field(39, 44);
    let number = match padded_number.trim_start_matches('0') {
        "" => padded_number.as_str(),
        stripped => stripped,
    };

    Some(BoardingPass {
        passenger: Passenger {
            name: normalize_name(&field(2, 22)),
        },
        flight: TicketFlight {
            number: non_empty(format!("{carrier}{number}")),
            date: julian_to_date(&field(44, 47), year),
            departure: Endpoint {
                airport: non_empty(field(30, 33)),
                datetime: None,
            },
            arrival: Endpoint {
                airport: non_empty(field(33, 36)),
                datetime: None,
            },
        },
        seat: non_empty(field(48, 52)),
        pnr: non_empty(field(23, 30)),
    })
}

/// Turn a day-of-year (`1` is January 1st) into a date in `year`.
///
/// Days past the end of the year roll into the next one. Returns `None` for
/// zero or text that is not a number.
#[must_use]
pub fn julian_to_date(julian: &str, year: i32) -> Option<NaiveDate> {
    let day: u64 = julian.trim().parse().ok()?;
    if day == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)?.checked_add_days(Days::new(day - 1))
}

/// Rewrite `LAST/FIRST MR` as `FIRST LAST`. Names without a slash are only
/// whitespace-normalized.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let Some((last, rest)) = collapsed.split_once('/') else {
        return Some(collapsed);
    };
    // Only the segment up to a second slash counts as the given name.
    let rest = rest.split('/').next().unwrap_or_default();
    let first = rest.split(' ').next().unwrap_or_default();
    let full = format!("{} {}", first.trim(), last.trim()).trim().to_string();

    Some(if full.is_empty() { collapsed } else { full })
}
