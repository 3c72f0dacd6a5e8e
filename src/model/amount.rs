//! Amount type for handling monetary values typed and displayed in the budget locale.
//!
//! Users type amounts either as `1.500,50` (grouping `.`, decimal `,`) or as `1500.50`. Amounts
//! are always displayed in the budget locale with two fractional digits, e.g. `1.500,50`. On the
//! wire amounts travel as plain decimal strings, e.g. `"1500.50"`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Grouping separator of the display locale.
const GROUPING: char = '.';

/// Decimal separator of the display locale.
const DECIMAL: char = ',';

/// Amounts are kept in cents.
const SCALE: u32 = 2;

/// Represents a non-negative monetary amount.
///
/// `Display` renders the amount in the budget locale, while `Serialize` writes the plain decimal
/// string the backend expects.
///
/// # Examples
///
/// ```
/// # use cmms_budget::model::Amount;
/// let amount = Amount::parse("1.500,75");
/// assert_eq!(amount.to_string(), "1.500,75");
/// assert_eq!(serde_json::to_string(&amount).unwrap(), "\"1500.75\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses user-typed text. Malformed text is treated as no value and becomes zero.
    pub fn parse(text: &str) -> Self {
        Self(parse_amount(text))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }
}

/// Converts free-form user text into a non-negative amount.
///
/// Both `1.500,50` and `1500.50` styles are accepted. When only dots are present, a final group of
/// exactly three digits marks the dots as thousands separators, so `8.000` is eight thousand and
/// `8.50` is eight and a half. This also means `1.234` reads as `1234`, never as `1.234`.
///
/// The result is rounded to cents, half away from zero, so `1,005` is `1.01`. Empty, unparseable
/// or negative input yields zero.
pub fn parse_amount(text: &str) -> Decimal {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let has_dot = compact.contains('.');
    let has_comma = compact.contains(',');

    let normalized = match (has_dot, has_comma) {
        (true, true) => compact.replace('.', "").replace(',', "."),
        (false, true) => compact.replace(',', "."),
        (true, false) => {
            let groups: Vec<&str> = compact.split('.').collect();
            let last = groups.last().copied().unwrap_or_default();
            if groups.len() > 1 && last.len() == 3 && last.chars().all(|c| c.is_ascii_digit()) {
                compact.replace('.', "")
            } else {
                compact
            }
        }
        (false, false) => compact,
    };

    match Decimal::from_str(&normalized) {
        Ok(value) if value.is_sign_negative() => Decimal::ZERO,
        Ok(value) => to_cents(value).normalize(),
        Err(_) => Decimal::ZERO,
    }
}

fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders `value` with two fractional digits, `.` grouping and `,` decimals, e.g. `1.500,75`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = to_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (int, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(GROUPING);
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}{DECIMAL}{frac}")
}

/// Formats a numeric string such as `"1500.5"`. Anything that is not a number formats as an empty
/// string.
pub fn format_amount_str(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(value) = Decimal::from_str(trimmed) {
        return format_amount(value);
    }
    match trimmed.parse::<f64>().ok().and_then(Decimal::from_f64) {
        Some(value) => format_amount(value),
        None => String::new(),
    }
}

/// Reads a stored amount. Strings, numbers and null are all accepted and anything missing or
/// non-numeric counts as zero.
pub fn to_amount(value: &Value) -> Amount {
    let decimal = match value {
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or_default(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                n.as_f64().and_then(Decimal::from_f64).unwrap_or_default()
            }
        }
        _ => Decimal::ZERO,
    };
    Amount(to_cents(decimal))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

impl FromStr for Amount {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Amount::parse(s))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", to_cents(self.0)))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(to_amount(&value))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
