#![forbid(unsafe_code)]

//! Demo for the chime crates: several writer threads race to move an
//! [`ObservableValue<Date>`](chime_core::ObservableValue) forward while
//! registered observers log each change.
//!
//! The binary wraps [`scenario::run`] with option parsing ([`cli::Opts`])
//! and a `tracing-subscriber` setup. Library form exists so the scenario can
//! be driven from tests.

pub mod cli;
pub mod scenario;

pub use cli::Opts;
pub use scenario::{DateObserver, ObserverSummary, Report, run};
