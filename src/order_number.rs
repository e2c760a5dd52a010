//! Human-facing order numbers: `ORD-YYYYMMDD-NNNN`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

const PREFIX: &str = "ORD";
const SUFFIX_MODULUS: u32 = 10_000;

/// Date-stamped order number. Unique enough to read out over the phone, not a key:
/// the store's record id is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderNumber(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed order number '{0}', expected ORD-YYYYMMDD-NNNN")]
pub struct OrderNumberError(pub String);

impl OrderNumber {
    /// `sequence` is taken modulo 10 000 and zero padded to four digits.
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        OrderNumber(format!(
            "{PREFIX}-{}-{:04}",
            date.format("%Y%m%d"),
            sequence % SUFFIX_MODULUS
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The date stamped into the number.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.0.get(4..12)?, "%Y%m%d").ok()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || OrderNumberError(s.to_string());

        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if prefix != PREFIX || suffix.len() != 4 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if date.len() != 8 || NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
            return Err(malformed());
        }

        Ok(OrderNumber(s.to_string()))
    }
}
