#![forbid(unsafe_code)]

//! Thread-safe observable value with change notification and version tracking.
//!
//! # Design
//!
//! [`ObservableValue<T>`] pairs a `parking_lot::Mutex` around the value (and
//! its version counter) with an embedded [`Observable<T>`]. Mutations happen
//! under the lock; the stored value is snapshotted, the lock is released, and
//! only then are observers notified. Observers never run under the value
//! lock, so they may call [`get`](ObservableValue::get) freely.
//!
//! Whether setting an equal value notifies is a [`ChangePolicy`]:
//!
//! - [`ChangePolicy::SkipUnchanged`] (default): equal values are a no-op.
//! - [`ChangePolicy::AlwaysNotify`]: every `set` notifies, changed or not.
//!
//! Payloads without `PartialEq` use [`replace`](ObservableValue::replace),
//! which always notifies.
//!
//! # Performance
//!
//! | Operation   | Complexity                 |
//! |-------------|----------------------------|
//! | `get()`     | O(1) + `T::clone`          |
//! | `set()`     | O(S) where S = observers   |
//! | `version()` | O(1)                       |
//!
//! # Failure Modes
//!
//! - **Racing writers**: two concurrent `set` calls serialize on the value
//!   lock, but their notifications may reach observers in either order. The
//!   stored value is whichever mutation ran last.
//! - **Re-entrant `with`**: calling `set` from inside the `with` closure
//!   deadlocks on the value lock.

use std::fmt;

use parking_lot::Mutex;

use super::observable::Observable;

/// When [`ObservableValue::set`] notifies observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangePolicy {
    /// Notify only when the new value differs from the stored one.
    #[default]
    SkipUnchanged,
    /// Notify on every `set`, even when the value is unchanged.
    AlwaysNotify,
}

struct ValueState<T> {
    value: T,
    version: u64,
}

/// A guarded value that broadcasts changes to its observers.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. Observers receive the value the triggering mutation stored.
/// 3. `get` and `set` are linearizable with respect to each other.
pub struct ObservableValue<T> {
    state: Mutex<ValueState<T>>,
    policy: ChangePolicy,
    observable: Observable<T>,
}

impl<T: Clone + 'static> ObservableValue<T> {
    /// Create a value with the default [`ChangePolicy`].
    ///
    /// The initial version is 0 and no observers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_policy(value, ChangePolicy::default())
    }

    /// Create a value with an explicit [`ChangePolicy`].
    #[must_use]
    pub fn with_policy(value: T, policy: ChangePolicy) -> Self {
        Self {
            state: Mutex::new(ValueState { value, version: 0 }),
            policy,
            observable: Observable::new(),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.state.lock().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// The value lock is held while `f` runs.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.lock().value)
    }

    /// Store `value` unconditionally and notify observers.
    ///
    /// Returns the previous value. Bumps the version even if the two are
    /// equal, since no comparison is made.
    pub fn replace(&self, value: T) -> T {
        let (previous, snapshot) = {
            let mut state = self.state.lock();
            let previous = std::mem::replace(&mut state.value, value);
            state.version += 1;
            (previous, state.value.clone())
        };
        self.observable.notify_observers(&snapshot);
        previous
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// The notification policy this value was built with.
    #[must_use]
    pub fn policy(&self) -> ChangePolicy {
        self.policy
    }

    /// The observable observers register with.
    #[must_use]
    pub fn observable(&self) -> &Observable<T> {
        &self.observable
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Set a new value and notify observers according to the policy.
    ///
    /// Returns whether the stored value changed.
    pub fn set(&self, value: T) -> bool {
        let (changed, snapshot) = {
            let mut state = self.state.lock();
            let changed = state.value != value;
            if changed {
                state.value = value;
                state.version += 1;
            } else if self.policy == ChangePolicy::SkipUnchanged {
                return false;
            }
            (changed, state.value.clone())
        };
        self.observable.notify_observers(&snapshot);
        changed
    }

    /// Modify the value via a closure.
    ///
    /// `f` runs on a copy of the stored value; the copy is written back only
    /// if it differs. A panic in `f` leaves the value and version untouched.
    /// Returns whether the stored value changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let (changed, snapshot) = {
            let mut state = self.state.lock();
            let mut next = state.value.clone();
            f(&mut next);
            let changed = next != state.value;
            if changed {
                state.value = next;
                state.version += 1;
            } else if self.policy == ChangePolicy::SkipUnchanged {
                return false;
            }
            (changed, state.value.clone())
        };
        self.observable.notify_observers(&snapshot);
        changed
    }
}

impl<T: Clone + Default + 'static> Default for ObservableValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ObservableValue")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("policy", &self.policy)
            .field("observable", &self.observable)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
