//! Flight designator parsing.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Airline code (2-3 letters), optional spaces, leading zeros, then up to
/// four digits with an optional operational suffix letter.
const DESIGNATOR_PATTERN: &str = r"^([A-Z]{2,3})\s*0*([0-9]{1,4}[A-Z]?)$";

fn designator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DESIGNATOR_PATTERN).expect("designator pattern is valid"))
}

/// A parsed flight designator such as `LH400`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlightDesignator {
    airline: String,
    number: String,
}

impl FlightDesignator {
    /// Parse free-form input like `"lh 0400"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the input does not look like a designator.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_uppercase();
        let caps = designator_regex()
            .captures(&normalized)
            .ok_or_else(|| Error::invalid_input("Invalid flight number"))?;

        Ok(Self {
            airline: caps[1].to_string(),
            number: caps[2].to_string(),
        })
    }

    /// The IATA/ICAO airline code.
    #[must_use]
    pub fn airline(&self) -> &str {
        &self.airline
    }

    /// The flight number without leading zeros.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Airline code and number joined, as used in upstream URLs.
    #[must_use]
    pub fn code(&self) -> String {
        format!("{}{}", self.airline, self.number)
    }
}

impl fmt::Display for FlightDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.airline, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_space() {
        let d = FlightDesignator::parse("LH 400").unwrap();
        assert_eq!(d.airline(), "LH");
        assert_eq!(d.number(), "400");
        assert_eq!(d.code(), "LH400");
    }

    #[test]
    fn test_parse_lowercase_and_padding() {
        let d = FlightDesignator::parse("  os0012 ").unwrap();
        assert_eq!(d.code(), "OS12");
    }

    #[test]
    fn test_parse_three_letter_code_and_suffix() {
        let d = FlightDesignator::parse("EZY1234A").unwrap();
        assert_eq!(d.airline(), "EZY");
        assert_eq!(d.number(), "1234A");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for input in ["123", "", "L400", "LH", "LH 12345", "LH-400", "LHAB400"] {
            let err = FlightDesignator::parse(input).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{input}");
        }
    }

    #[test]
    fn test_display() {
        let d = FlightDesignator::parse("ua 9").unwrap();
        assert_eq!(d.to_string(), "UA9");
    }
}
