use crate::{Error, Result};
use anyhow::{ensure, Context};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Format of the month dates exchanged with the backend, e.g. `2025-03-01`.
const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar month number, always in `1..=12`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    pub const JANUARY: Month = Month(1);
    pub const DECEMBER: Month = Month(12);

    pub fn new(number: u8) -> Result<Self> {
        ensure!(
            (1..=12).contains(&number),
            "Month must be between 1 and 12, got {number}"
        );
        Ok(Self(number))
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// The first day of this month in `year`, in the `YYYY-MM-01` form the backend uses.
    pub fn wire_date(self, year: i32) -> String {
        format!("{year:04}-{:02}-01", self.0)
    }

    /// Reads the month out of a backend date such as `2025-03-01`.
    pub fn from_wire_date(date: &str) -> Result<Self> {
        let parsed = NaiveDate::parse_from_str(date.trim(), WIRE_DATE_FORMAT)
            .with_context(|| format!("Invalid month date '{date}'"))?;
        // chrono months are always 1..=12
        Ok(Self(parsed.month() as u8))
    }
}

impl TryFrom<u8> for Month {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Month::new(value)
    }
}

impl From<Month> for u8 {
    fn from(value: Month) -> Self {
        value.0
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: u8 = s
            .trim()
            .parse()
            .with_context(|| format!("Invalid month '{s}'"))?;
        Month::new(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_range() {
        assert!(Month::new(0).is_err());
        assert!(Month::new(13).is_err());
        assert_eq!(Month::new(1).unwrap(), Month::JANUARY);
        assert_eq!(Month::new(12).unwrap(), Month::DECEMBER);
    }

    #[test]
    fn test_all() {
        let all: Vec<u8> = Month::all().map(Month::number).collect();
        assert_eq!(all, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_wire_date() {
        assert_eq!(Month::new(3).unwrap().wire_date(2025), "2025-03-01");
        assert_eq!(Month::DECEMBER.wire_date(2024), "2024-12-01");
    }

    #[test]
    fn test_from_wire_date() {
        assert_eq!(Month::from_wire_date("2025-07-01").unwrap().number(), 7);
        assert!(Month::from_wire_date("2025-13-01").is_err());
        assert!(Month::from_wire_date("July").is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Month>("4").is_ok());
        assert!(serde_json::from_str::<Month>("0").is_err());
    }
}
