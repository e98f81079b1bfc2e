#![forbid(unsafe_code)]

//! The subject side of the observer protocol.
//!
//! # Design
//!
//! [`Observable<T>`] wraps shared, reference-counted state
//! (`Arc<ObservableInner<T>>`): a [`Signal<T>`] plus a map from
//! [`ObserverId`] to the [`Connection<T>`] that forwards to that observer.
//! The map owns the connections, so an observer's callback stays reachable
//! exactly as long as its entry exists.
//!
//! # Locking
//!
//! Registration takes the map lock, then the signal lock. Emission takes the
//! signal lock only. Observer targets therefore run under the signal lock
//! and must not call back into the same observable.
//!
//! # Failure Modes
//!
//! - **Re-entrant registration**: registering or unregistering on the same
//!   observable from inside `on_notify` deadlocks.
//! - **Panicking target**: unwinds out of
//!   [`notify_observers`](Observable::notify_observers); observers later in
//!   the registration order miss that notification only.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::observer::{Notify, ObserverId};
use crate::signal::{Connection, Signal};

/// Stable, process-unique identity of an [`Observable`].
///
/// Clones of an observable share its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservableId(u64);

impl ObservableId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observable#{}", self.0)
    }
}

/// Shared interior for [`Observable<T>`].
pub(super) struct ObservableInner<T> {
    id: ObservableId,
    signal: Signal<T>,
    connections: Mutex<HashMap<ObserverId, Connection<T>>>,
}

impl<T: 'static> ObservableInner<T> {
    fn register(&self, observer: ObserverId, target: Arc<dyn Notify<T>>) -> bool {
        let mut connections = self.connections.lock();
        if connections.contains_key(&observer) {
            return false;
        }
        let connection = self
            .signal
            .connect(move |value: &T| target.on_notify(value));
        connections.insert(observer, connection);
        debug!(
            observable = %self.id,
            %observer,
            observers = connections.len(),
            "observer registered"
        );
        true
    }

    pub(super) fn unregister(&self, observer: ObserverId) -> bool {
        // The connection is dropped only after the lock is released.
        let removed = {
            let mut connections = self.connections.lock();
            let removed = connections.remove(&observer);
            if let Some(connection) = &removed {
                self.signal.disconnect(connection);
                debug!(
                    observable = %self.id,
                    %observer,
                    observers = connections.len(),
                    "observer unregistered"
                );
            }
            removed
        };
        removed.is_some()
    }
}

/// A subject that notifies registered observers.
///
/// Cloning an `Observable` creates a new handle to the **same** state: both
/// handles share the id, the registrations, and the signal.
///
/// # Invariants
///
/// 1. At most one connection per [`ObserverId`].
/// 2. [`notify_observers`](Self::notify_observers) invokes each observer
///    registered when it acquired the signal lock exactly once.
pub struct Observable<T> {
    inner: Arc<ObservableInner<T>>,
}

// Manual Clone: shares the same Arc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Create an observable with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                id: ObservableId::fresh(),
                signal: Signal::new(),
                connections: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// This observable's identity.
    #[must_use]
    pub fn id(&self) -> ObservableId {
        self.inner.id
    }

    /// Register `target` under `observer`.
    ///
    /// Returns `false` without touching anything if `observer` is already
    /// registered. [`Observer::register_with`](super::Observer::register_with)
    /// is the usual entry point; calling this directly skips the observer's
    /// own bookkeeping, so the caller owns the matching
    /// [`unregister_observer`](Self::unregister_observer).
    pub fn register_observer(&self, observer: ObserverId, target: Arc<dyn Notify<T>>) -> bool {
        self.inner.register(observer, target)
    }

    /// Remove the registration for `observer`, if any.
    ///
    /// Returns whether an entry was removed. Blocks while a notification is
    /// in progress on another thread.
    pub fn unregister_observer(&self, observer: ObserverId) -> bool {
        self.inner.unregister(observer)
    }

    /// Whether `observer` currently has a registration here.
    #[must_use]
    pub fn is_registered(&self, observer: ObserverId) -> bool {
        self.inner.connections.lock().contains_key(&observer)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    /// Notify every registered observer with `value`.
    pub fn notify_observers(&self, value: &T) {
        self.inner.signal.emit(value);
    }

    /// Subscribe a bare callback, bypassing observer bookkeeping.
    ///
    /// The callback fires for as long as the returned [`Connection`] (or a
    /// clone of it) is alive.
    #[must_use = "dropping the connection immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Connection<T> {
        self.inner.signal.connect(callback)
    }

    /// The underlying signal.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.inner.signal
    }

    pub(super) fn downgrade(&self) -> Weak<ObservableInner<T>> {
        Arc::downgrade(&self.inner)
    }
}

impl<T: 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.inner.id)
            .field("observer_count", &self.inner.connections.lock().len())
            .field("signal", &self.inner.signal)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
