#![forbid(unsafe_code)]

//! The [`Date`] value type and its duration newtypes.
//!
//! # Design
//!
//! A `Date` stores the calendar date together with its serial number, the
//! signed day count from 1970-01-01. Both are recomputed together on every
//! construction, so the pair never disagrees. `Date` is `Copy`; exclusive
//! mutation (`+=`) goes through `&mut self`, and dates shared between threads
//! live behind an observable value's lock.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Impossible triple | `Date::new(2023, 2, 30)` | `Err(DateError::InvalidDate)` |
//! | Overflow | Shift past the supported calendar range | `checked_*` return `Err(OutOfRange)`; operators panic |
//! | Bad string | `"2023/01/01".parse()` | `Err(DateError::Parse)` |

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::DateError;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A span of calendar years. Shifts clamp the day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Years(pub i32);

/// A span of calendar months. Shifts clamp the day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Months(pub i32);

/// An exact span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Days(pub i64);

/// A valid calendar date with a cached serial number.
///
/// # Invariants
///
/// 1. The calendar triple is always a real date.
/// 2. `serial_number()` is the day count from 1970-01-01 to that date.
/// 3. `==`, `<`, and hashing look at the serial number only.
#[derive(Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Date {
    ymd: NaiveDate,
    serial: i64,
}

impl Date {
    /// Build a date from a calendar triple.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::InvalidDate`] if the triple is not a real date.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::from_naive)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Build a date from its serial number (days since 1970-01-01).
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] outside the supported range.
    pub fn from_serial_number(serial: i64) -> Result<Self, DateError> {
        i32::try_from(serial)
            .ok()
            .and_then(|days| days.checked_add(UNIX_EPOCH_DAYS_FROM_CE))
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Self::from_naive)
            .ok_or(DateError::OutOfRange)
    }

    fn from_naive(ymd: NaiveDate) -> Self {
        let serial = i64::from(ymd.num_days_from_ce()) - i64::from(UNIX_EPOCH_DAYS_FROM_CE);
        Self { ymd, serial }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.ymd.year()
    }

    /// Month of year, 1 through 12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.ymd.month()
    }

    /// Day of month, starting at 1.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.ymd.day()
    }

    /// Days since 1970-01-01; negative before it.
    #[must_use]
    pub fn serial_number(&self) -> i64 {
        self.serial
    }

    #[must_use]
    pub fn is_leap_year(&self) -> bool {
        let year = self.year();
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Last valid day of this date's month.
    #[must_use]
    pub fn last_day_of_month(&self) -> u32 {
        let month = self.month();
        if month == 2 && self.is_leap_year() {
            return 29;
        }
        DAYS_IN_MONTH[(month - 1) as usize]
    }

    /// Shift by whole years, clamping the day of month.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_add_years(self, years: Years) -> Result<Self, DateError> {
        self.shift_months(i64::from(years.0) * 12)
    }

    /// Shift back by whole years, clamping the day of month.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_sub_years(self, years: Years) -> Result<Self, DateError> {
        self.shift_months(-i64::from(years.0) * 12)
    }

    /// Shift by whole months, clamping the day of month.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_add_months(self, months: Months) -> Result<Self, DateError> {
        self.shift_months(i64::from(months.0))
    }

    /// Shift back by whole months, clamping the day of month.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_sub_months(self, months: Months) -> Result<Self, DateError> {
        self.shift_months(-i64::from(months.0))
    }

    /// Shift by an exact number of days.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_add_days(self, days: Days) -> Result<Self, DateError> {
        self.shift_days(days.0)
    }

    /// Shift back by an exact number of days.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::OutOfRange`] on overflow.
    pub fn checked_sub_days(self, days: Days) -> Result<Self, DateError> {
        self.shift_days(days.0.checked_neg().ok_or(DateError::OutOfRange)?)
    }

    fn shift_months(self, months: i64) -> Result<Self, DateError> {
        // chrono clamps to the end of the month for both directions.
        let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| DateError::OutOfRange)?;
        let span = chrono::Months::new(magnitude);
        let shifted = if months >= 0 {
            self.ymd.checked_add_months(span)
        } else {
            self.ymd.checked_sub_months(span)
        };
        shifted.map(Self::from_naive).ok_or(DateError::OutOfRange)
    }

    fn shift_days(self, days: i64) -> Result<Self, DateError> {
        let span = chrono::Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            self.ymd.checked_add_days(span)
        } else {
            self.ymd.checked_sub_days(span)
        };
        shifted.map(Self::from_naive).ok_or(DateError::OutOfRange)
    }
}

/// 1900-01-01.
impl Default for Date {
    fn default() -> Self {
        match NaiveDate::from_ymd_opt(1900, 1, 1) {
            Some(ymd) => Self::from_naive(ymd),
            None => Self::from_naive(NaiveDate::MIN),
        }
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for Date {}

impl PartialOrd for Date {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Date {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serial.cmp(&other.serial)
    }
}

impl Hash for Date {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serial.hash(state);
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Date")
            .field("ymd", &format_args!("{self}"))
            .field("serial", &self.serial)
            .finish()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self::from_naive)
            .map_err(|_| DateError::Parse(s.to_string()))
    }
}

impl TryFrom<String> for Date {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Date> for String {
    fn from(date: Date) -> Self {
        date.to_string()
    }
}

/// Operator forms of the `checked_*` methods.
///
/// # Panics
///
/// The operators panic if the result leaves the supported calendar range,
/// as integer arithmetic does on overflow.
macro_rules! impl_date_ops {
    ($span:ty, $add:ident, $sub:ident) => {
        impl Add<$span> for Date {
            type Output = Date;

            fn add(self, rhs: $span) -> Date {
                match self.$add(rhs) {
                    Ok(date) => date,
                    Err(err) => panic!("{self} + {rhs:?}: {err}"),
                }
            }
        }

        impl Sub<$span> for Date {
            type Output = Date;

            fn sub(self, rhs: $span) -> Date {
                match self.$sub(rhs) {
                    Ok(date) => date,
                    Err(err) => panic!("{self} - {rhs:?}: {err}"),
                }
            }
        }

        impl AddAssign<$span> for Date {
            fn add_assign(&mut self, rhs: $span) {
                *self = *self + rhs;
            }
        }

        impl SubAssign<$span> for Date {
            fn sub_assign(&mut self, rhs: $span) {
                *self = *self - rhs;
            }
        }
    };
}

impl_date_ops!(Years, checked_add_years, checked_sub_years);
impl_date_ops!(Months, checked_add_months, checked_sub_months);
impl_date_ops!(Days, checked_add_days, checked_sub_days);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    #[test]
    fn components_round_trip() {
        let d = date(2023, 7, 14);
        assert_eq!((d.year(), d.month(), d.day()), (2023, 7, 14));
    }

    #[test]
    fn invalid_triples_rejected() {
        assert_eq!(
            Date::new(2023, 2, 30),
            Err(DateError::InvalidDate {
                year: 2023,
                month: 2,
                day: 30
            })
        );
        assert!(Date::new(2023, 4, 31).is_err());
        assert!(Date::new(2023, 13, 1).is_err());
        assert!(Date::new(2023, 0, 1).is_err());
        assert!(Date::new(2023, 2, 29).is_err());
        assert!(Date::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn serial_numbers_from_epoch() {
        assert_eq!(date(1970, 1, 1).serial_number(), 0);
        assert_eq!(date(1970, 1, 2).serial_number(), 1);
        assert_eq!(date(1969, 12, 31).serial_number(), -1);
        assert_eq!(Date::default().serial_number(), -25_567);
        assert_eq!(Date::default(), date(1900, 1, 1));
    }

    #[test]
    fn from_serial_number_round_trip() {
        let d = date(2024, 2, 29);
        assert_eq!(Date::from_serial_number(d.serial_number()), Ok(d));
        assert_eq!(
            Date::from_serial_number(i64::MAX),
            Err(DateError::OutOfRange)
        );
    }

    #[test]
    fn month_shift_clamps_to_month_end() {
        assert_eq!(date(2024, 1, 31) + Months(1), date(2024, 2, 29));
        assert_eq!(date(2023, 1, 31) + Months(1), date(2023, 2, 28));
        assert_eq!(date(2023, 3, 31) - Months(1), date(2023, 2, 28));
        assert_eq!(date(2023, 5, 31) + Months(1), date(2023, 6, 30));
        assert_eq!(date(2023, 11, 15) + Months(3), date(2024, 2, 15));
    }

    #[test]
    fn year_shift_clamps_leap_day() {
        assert_eq!(date(2024, 2, 29) + Years(1), date(2025, 2, 28));
        assert_eq!(date(2024, 2, 29) - Years(4), date(2020, 2, 29));
        assert_eq!(date(2023, 1, 1) + Years(3), date(2026, 1, 1));
    }

    #[test]
    fn day_shift_is_exact() {
        assert_eq!(date(2024, 1, 31) + Days(1), date(2024, 2, 1));
        assert_eq!(date(2024, 3, 1) - Days(1), date(2024, 2, 29));
        assert_eq!(date(2023, 12, 31) + Days(1), date(2024, 1, 1));
        assert_eq!(date(2024, 1, 1) + Days(-1), date(2023, 12, 31));
    }

    #[test]
    fn assign_operators() {
        let mut d = date(2023, 1, 31);
        d += Months(1);
        assert_eq!(d, date(2023, 2, 28));
        d -= Days(28);
        assert_eq!(d, date(2023, 1, 31));
        d += Years(1);
        assert_eq!(d, date(2024, 1, 31));
        d -= Months(12);
        assert_eq!(d, date(2023, 1, 31));
    }

    #[test]
    fn checked_overflow_reports_out_of_range() {
        let d = date(2023, 1, 1);
        assert_eq!(d.checked_add_days(Days(i64::MAX)), Err(DateError::OutOfRange));
        assert_eq!(d.checked_sub_days(Days(i64::MIN)), Err(DateError::OutOfRange));
        assert_eq!(
            d.checked_add_years(Years(i32::MAX)),
            Err(DateError::OutOfRange)
        );
    }

    #[test]
    #[should_panic(expected = "date out of range")]
    fn operator_overflow_panics() {
        let _ = date(2023, 1, 1) + Days(i64::MAX);
    }

    #[test]
    fn ordering_follows_serial() {
        let a = date(2023, 12, 31);
        let b = date(2024, 1, 1);
        assert!(a < b);
        assert!(b >= a);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn leap_years_and_month_ends() {
        assert!(date(2024, 5, 1).is_leap_year());
        assert!(date(2000, 5, 1).is_leap_year());
        assert!(!date(1900, 5, 1).is_leap_year());
        assert_eq!(date(2024, 2, 3).last_day_of_month(), 29);
        assert_eq!(date(2023, 2, 3).last_day_of_month(), 28);
        assert_eq!(date(2023, 4, 3).last_day_of_month(), 30);
        assert_eq!(date(2023, 12, 3).last_day_of_month(), 31);
    }

    #[test]
    fn display_and_parse() {
        let d = date(2023, 1, 5);
        assert_eq!(d.to_string(), "2023-01-05");
        assert_eq!("2023-01-05".parse::<Date>(), Ok(d));
        assert_eq!(
            "2023/01/05".parse::<Date>(),
            Err(DateError::Parse("2023/01/05".into()))
        );
        assert!("2023-02-30".parse::<Date>().is_err());
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", date(2023, 1, 5));
        assert!(dbg.contains("2023-01-05"));
        assert!(dbg.contains("serial"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_string() {
        let d = date(2024, 2, 29);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2024-02-29\"");
        let back: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
