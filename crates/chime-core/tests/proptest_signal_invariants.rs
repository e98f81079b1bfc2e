//! Property-based invariant tests for [`Signal`] and [`ObservableValue`].
//!
//! 1. Every live slot is invoked exactly once per emit, in connection order.
//! 2. Dropped or disconnected slots are never invoked, and the registry
//!    holds only live entries after the next emit.
//! 3. Under `SkipUnchanged`, observers see exactly the values that differ
//!    from their predecessor; the version counts those changes.

use std::sync::Arc;

use chime_core::{Notify, ObservableValue, Observer, Signal};
use parking_lot::Mutex;
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

/// What happens to each connection before the emit.
#[derive(Debug, Clone, Copy)]
enum Fate {
    Keep,
    Drop,
    Disconnect,
}

fn fate_strategy() -> impl Strategy<Value = Fate> {
    prop_oneof![
        3 => Just(Fate::Keep),
        1 => Just(Fate::Drop),
        1 => Just(Fate::Disconnect),
    ]
}

struct Log(Mutex<Vec<i32>>);

impl Notify<i32> for Log {
    fn on_notify(&self, value: &i32) {
        self.0.lock().push(*value);
    }
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn live_slots_fire_once_in_order(fates in prop::collection::vec(fate_strategy(), 0..32)) {
        let signal = Signal::<usize>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let connections: Vec<_> = (0..fates.len())
            .map(|i| {
                let log = Arc::clone(&log);
                signal.connect(move |round| log.lock().push((*round, i)))
            })
            .collect();

        let mut held = Vec::new();
        let mut expected = Vec::new();
        for (i, (conn, fate)) in connections.into_iter().zip(&fates).enumerate() {
            match fate {
                Fate::Keep => {
                    expected.push(i);
                    held.push((conn, true));
                }
                Fate::Drop => drop(conn),
                Fate::Disconnect => {
                    signal.disconnect(&conn);
                    held.push((conn, false));
                }
            }
        }

        signal.emit(&0);
        signal.emit(&1);

        let log = log.lock();
        let round = |r: usize| {
            log.iter()
                .filter(|(n, _)| *n == r)
                .map(|(_, i)| *i)
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(round(0), expected.clone());
        prop_assert_eq!(round(1), expected.clone());
        prop_assert_eq!(signal.slot_count(), expected.len());
        for (conn, live) in &held {
            prop_assert_eq!(signal.is_connected(conn), *live);
        }
    }

    #[test]
    fn skip_unchanged_reports_each_change(values in prop::collection::vec(0i32..4, 0..64)) {
        let value = ObservableValue::new(0);
        let observer = Observer::new(Log(Mutex::new(Vec::new())));
        observer.register_with(value.observable());

        let mut expected = Vec::new();
        let mut previous = 0;
        for v in &values {
            let changed = value.set(*v);
            prop_assert_eq!(changed, *v != previous);
            if changed {
                expected.push(*v);
            }
            previous = *v;
        }

        prop_assert_eq!(observer.target().0.lock().clone(), expected.clone());
        prop_assert_eq!(value.version(), expected.len() as u64);
        prop_assert_eq!(value.get(), previous);
    }
}
