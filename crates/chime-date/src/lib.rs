#![forbid(unsafe_code)]

//! Calendar dates used as the reference payload for chime observables.
//!
//! # Role in chime
//! `chime-date` provides [`Date`], a small value type with calendar
//! arithmetic. It has no dependency on `chime-core`; the demo threads it
//! through an `ObservableValue<Date>`.
//!
//! # Arithmetic rules
//! - Year and month shifts clamp the day to the last valid day of the
//!   resulting month (Jan 31 + 1 month is Feb 28 or Feb 29).
//! - Day shifts are exact.
//! - Ordering and equality use the serial number (days since 1970-01-01).

pub mod date;
pub mod error;

pub use date::{Date, Days, Months, Years};
pub use error::DateError;
