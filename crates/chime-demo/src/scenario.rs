#![forbid(unsafe_code)]

//! The demo run: writer threads racing to move an observable date forward.
//!
//! Each writer reads the current date and stores `date + Years(delta)`.
//! The read and the write are separate operations, so writers can overwrite
//! each other; the final date depends on the interleaving. Observers log every
//! notification they receive and keep a tally for the summary.

use std::fmt;
use std::thread;

use chime_core::{ChangePolicy, Notify, ObservableValue, Observer};
use chime_date::{Date, Years};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::cli::Opts;

/// An observer target that logs and records each date it is notified of.
#[derive(Debug)]
pub struct DateObserver {
    name: String,
    seen: Mutex<Vec<Date>>,
}

impl DateObserver {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every date received, in arrival order.
    #[must_use]
    pub fn seen(&self) -> Vec<Date> {
        self.seen.lock().clone()
    }

    fn summary(&self) -> ObserverSummary {
        let seen = self.seen.lock();
        ObserverSummary {
            name: self.name.clone(),
            notifications: seen.len(),
            last_seen: seen.last().copied(),
        }
    }
}

impl Notify<Date> for DateObserver {
    fn on_notify(&self, date: &Date) {
        info!(observer = %self.name, %date, "date updated");
        self.seen.lock().push(*date);
    }
}

/// Per-observer tally in a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObserverSummary {
    pub name: String,
    pub notifications: usize,
    pub last_seen: Option<Date>,
}

/// Outcome of one demo run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub start: Date,
    pub final_date: Date,
    /// Number of value-changing writes.
    pub version: u64,
    pub observers: Vec<ObserverSummary>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start:   {}", self.start)?;
        writeln!(f, "final:   {} (version {})", self.final_date, self.version)?;
        for observer in &self.observers {
            write!(
                f,
                "{:<12} {} notification(s)",
                observer.name, observer.notifications
            )?;
            match observer.last_seen {
                Some(date) => writeln!(f, ", last saw {date}")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Run the demo described by `opts` and summarize it.
///
/// A year delta that would push the date out of range is logged and skipped
/// by its writer rather than aborting the run.
#[must_use]
pub fn run(opts: &Opts) -> Report {
    let _span = info_span!("demo", start = %opts.start, writers = opts.years.len()).entered();

    let policy = if opts.always_notify {
        ChangePolicy::AlwaysNotify
    } else {
        ChangePolicy::SkipUnchanged
    };
    let value = ObservableValue::with_policy(opts.start, policy);

    let observers: Vec<_> = (1..=opts.observers)
        .map(|n| {
            let observer = Observer::new(DateObserver::new(format!("observer-{n}")));
            observer.register_with(value.observable());
            observer
        })
        .collect();
    info!(observers = observers.len(), ?policy, "observers registered");

    thread::scope(|s| {
        for &delta in &opts.years {
            let value = &value;
            s.spawn(move || {
                let current = value.get();
                match current.checked_add_years(Years(delta)) {
                    Ok(next) => {
                        let changed = value.set(next);
                        info!(delta, from = %current, to = %next, changed, "writer finished");
                    }
                    Err(err) => {
                        warn!(delta, from = %current, %err, "writer skipped");
                    }
                }
            });
        }
    });

    Report {
        start: opts.start,
        final_date: value.get(),
        version: value.version(),
        observers: observers.iter().map(|o| o.target().summary()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
