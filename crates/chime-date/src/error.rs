//! Errors from date construction, arithmetic, and parsing.

use std::fmt;

/// Errors from [`Date`](crate::Date) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The calendar triple does not name a real day.
    InvalidDate { year: i32, month: u32, day: u32 },
    /// The result falls outside the representable calendar range.
    OutOfRange,
    /// A string was not a `YYYY-MM-DD` date.
    Parse(String),
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate { year, month, day } => {
                write!(f, "invalid date: {year:04}-{month:02}-{day:02}")
            }
            Self::OutOfRange => write!(f, "date out of range"),
            Self::Parse(input) => write!(f, "invalid date string: {input:?}"),
        }
    }
}

impl std::error::Error for DateError {}
