#![forbid(unsafe_code)]

//! The observing side of the observer protocol.
//!
//! # Design
//!
//! Behaviour lives in the [`Notify`] trait; bookkeeping lives in
//! [`Observer<T, N>`], which owns the target and a map of the observables it
//! joined. There is no base class to inherit from: any `Notify` type becomes
//! an observer by being wrapped.
//!
//! `Observer` is a scoped guard. Its `Drop` unregisters from every observable
//! still alive, on every exit path including unwinding. Because
//! unregistration takes the observable's signal lock, a drop racing with a
//! notification on another thread waits for that notification to finish.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Drop inside `on_notify` | Observer dropped from a callback of an observable it joined | Deadlock |
//! | Observable dropped first | Observable gone before the observer | Entry skipped on drop |
//! | Direct registration | `Observable::register_observer` with this observer's id | Not tracked; not released on drop |

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::observable::{Observable, ObservableId, ObservableInner};

/// Receives notifications from an [`Observable`].
///
/// Implementations run synchronously on the notifying thread, while the
/// observable's signal lock is held.
pub trait Notify<T>: Send + Sync {
    /// Called once per notification with the broadcast value.
    fn on_notify(&self, value: &T);
}

/// Stable, process-unique identity of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Allocate an id no other observer in this process has.
    #[must_use]
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// A [`Notify`] target plus the set of observables it is registered with.
///
/// # Invariants
///
/// 1. Every observable in the tracking map has a registration for this
///    observer's id, unless that observable was dropped.
/// 2. After `drop` returns, no tracked observable invokes the target again.
pub struct Observer<T: 'static, N> {
    id: ObserverId,
    target: Arc<N>,
    joined: Mutex<HashMap<ObservableId, Weak<ObservableInner<T>>>>,
}

impl<T: 'static, N: Notify<T> + 'static> Observer<T, N> {
    /// Wrap `target` in a new observer with a fresh id.
    #[must_use]
    pub fn new(target: N) -> Self {
        Self::from_arc(Arc::new(target))
    }

    /// Wrap an already shared target.
    ///
    /// The caller may keep its own clone of `target` to read state the
    /// target accumulates; registrations still end when the observer drops.
    #[must_use]
    pub fn from_arc(target: Arc<N>) -> Self {
        Self {
            id: ObserverId::fresh(),
            target,
            joined: Mutex::new(HashMap::new()),
        }
    }

    /// This observer's identity.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// The notification target.
    #[must_use]
    pub fn target(&self) -> &N {
        &self.target
    }

    /// Start receiving notifications from `observable`.
    ///
    /// Returns `false` if this observer was already registered there.
    pub fn register_with(&self, observable: &Observable<T>) -> bool {
        let mut joined = self.joined.lock();
        let target: Arc<dyn Notify<T>> = self.target.clone();
        let added = observable.register_observer(self.id, target);
        joined.insert(observable.id(), observable.downgrade());
        added
    }

    /// Stop receiving notifications from `observable`.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn unregister_with(&self, observable: &Observable<T>) -> bool {
        let mut joined = self.joined.lock();
        let removed = observable.unregister_observer(self.id);
        joined.remove(&observable.id());
        removed
    }

    /// Whether this observer is registered with `observable`.
    #[must_use]
    pub fn is_registered_with(&self, observable: &Observable<T>) -> bool {
        self.joined.lock().contains_key(&observable.id())
    }

    /// Number of observables currently tracked.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.joined.lock().len()
    }
}

impl<T: 'static, N> Drop for Observer<T, N> {
    fn drop(&mut self) {
        let joined = std::mem::take(self.joined.get_mut());
        let mut released = 0usize;
        for inner in joined.into_values() {
            if let Some(inner) = inner.upgrade()
                && inner.unregister(self.id)
            {
                released += 1;
            }
        }
        debug!(observer = %self.id, released, "observer dropped");
    }
}

impl<T: 'static, N> fmt::Debug for Observer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("registrations", &self.joined.lock().len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
