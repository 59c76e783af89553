use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Monetary amount represented as **integer cents**.
///
/// The backend exchanges amounts as decimal strings (`"1500.00"`); some
/// endpoints answer with a JSON number instead, so both are accepted when
/// deserializing. Serialization always produces the two-decimal string.
///
/// # Examples
///
/// ```rust
/// use api_types::Amount;
///
/// assert_eq!("10,5".parse::<Amount>().unwrap().cents(), 1050);
/// assert_eq!(Amount::new(150_000).to_string(), "1500.00");
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount")]
    Invalid,
    #[error("too many decimals")]
    TooManyDecimals,
    #[error("amount too large")]
    Overflow,
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole units (`Amount::units(15)` is `15.00`).
    #[must_use]
    pub const fn units(units: i64) -> Self {
        Self(units * 100)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`;
    /// at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped.trim())
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped.trim())
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(AmountError::Empty);
        }

        let rest = rest.replace(',', ".");
        let (units_str, frac) = match rest.split_once('.') {
            Some((units, frac)) => (units, Some(frac)),
            None => (rest.as_str(), None),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError::Invalid);
        }
        let units: i64 = units_str.parse().map_err(|_| AmountError::Overflow)?;

        let cents: i64 = match frac {
            None | Some("") => 0,
            Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => {
                return Err(AmountError::Invalid);
            }
            Some(frac) if frac.len() == 1 => {
                frac.parse::<i64>().map_err(|_| AmountError::Invalid)? * 10
            }
            Some(frac) if frac.len() == 2 => {
                frac.parse::<i64>().map_err(|_| AmountError::Invalid)?
            }
            Some(_) => return Err(AmountError::TooManyDecimals),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or(AmountError::Overflow)?;

        Ok(Amount(if negative { -total } else { total }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(text) => text.parse().map_err(serde::de::Error::custom),
            RawAmount::Integer(units) => units
                .checked_mul(100)
                .map(Amount)
                .ok_or_else(|| serde::de::Error::custom(AmountError::Overflow)),
            RawAmount::Float(value) => Ok(Amount((value * 100.0).round() as i64)),
        }
    }
}
