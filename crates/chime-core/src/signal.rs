#![forbid(unsafe_code)]

//! Thread-safe multicast signal with weakly held slots.
//!
//! # Design
//!
//! A [`Signal<T>`] keeps an ordered list of `Weak` references to its slots
//! (callbacks). The strong side of each slot lives in the [`Connection<T>`]
//! returned by [`Signal::connect`], so the signal can observe a slot but never
//! keep it alive. When the last clone of a connection is dropped the slot
//! becomes unreachable; the dead entry is pruned on the next
//! [`emit`](Signal::emit) or [`disconnect`](Signal::disconnect).
//!
//! Slots take the payload by reference. Multiple arguments travel as a tuple:
//! `Signal<(u32, String)>`.
//!
//! # Locking
//!
//! `connect`, `disconnect` and `emit` share one mutex. `emit` holds it for
//! the whole traversal, so slot bodies run under the lock. Two consequences:
//!
//! - Once `disconnect` returns, that slot is not running on any thread and
//!   will not run again.
//! - A slot that calls back into the same signal deadlocks.
//!
//! # Performance
//!
//! | Operation      | Complexity                  |
//! |----------------|-----------------------------|
//! | `connect()`    | O(1) amortized              |
//! | `disconnect()` | O(S) where S = slots        |
//! | `emit()`       | O(S) plus slot bodies       |
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Re-entrant call | Slot calls `connect`/`disconnect`/`emit` on its own signal | Deadlock |
//! | Slot panics | Panic inside a slot body | Unwinds out of `emit`; later slots skipped for that pass; signal stays usable |
//! | Foreign handle | `disconnect` with a connection from another signal | Matches nothing, ignored |
//! | Leaked handles | Connections stored and never dropped | Slots keep firing; nothing is collected |

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Slot signature shared by the registry and the connection handles.
type Slot<T> = dyn Fn(&T) + Send + Sync;

/// Handle to a connected slot.
///
/// Holding any clone of the connection keeps the slot reachable. Clones
/// compare equal to each other and to the registry entry they came from.
pub struct Connection<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Connection<T> {
    /// Number of live handles to this slot.
    ///
    /// Includes a transient reference while the slot is being invoked.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.slot)
    }

    fn is_slot(&self, entry: &Weak<Slot<T>>) -> bool {
        std::ptr::addr_eq(entry.as_ptr(), Arc::as_ptr(&self.slot))
    }
}

// Manual Clone: no `T: Clone` bound needed.
impl<T> Clone for Connection<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> PartialEq for Connection<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Eq for Connection<T> {}

impl<T> Hash for Connection<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.slot).cast::<()>().hash(state);
    }
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("handle_count", &self.handle_count())
            .finish_non_exhaustive()
    }
}

/// A thread-safe multicast callback registry.
///
/// # Invariants
///
/// 1. The registry holds only `Weak` references; it never keeps a slot alive.
/// 2. Live slots are invoked in connection order, once per `emit`.
/// 3. Dead entries are pruned lazily, during `emit` and `disconnect` only.
pub struct Signal<T> {
    slots: Mutex<Vec<Weak<Slot<T>>>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Connect a slot. The returned [`Connection`] owns it.
    ///
    /// Connecting the same closure twice yields two independent entries.
    #[must_use = "dropping the connection immediately makes the slot unreachable"]
    pub fn connect(&self, slot: impl Fn(&T) + Send + Sync + 'static) -> Connection<T> {
        let slot: Arc<Slot<T>> = Arc::new(slot);
        self.slots.lock().push(Arc::downgrade(&slot));
        Connection { slot }
    }

    /// Remove the entry for `connection`, pruning expired entries on the way.
    ///
    /// Idempotent. A connection produced by a different signal matches
    /// nothing. Blocks while an emission is in progress.
    pub fn disconnect(&self, connection: &Connection<T>) {
        self.slots
            .lock()
            .retain(|entry| entry.strong_count() > 0 && !connection.is_slot(entry));
    }

    /// Invoke every live slot with `value`, in connection order.
    ///
    /// Entries whose connection has been dropped are removed.
    ///
    /// # Panics
    ///
    /// Propagates a panic raised by a slot. Slots after the panicking one are
    /// not invoked in that pass but remain connected.
    pub fn emit(&self, value: &T) {
        let mut slots = self.slots.lock();
        #[cfg(feature = "tracing")]
        let before = slots.len();

        slots.retain(|entry| match entry.upgrade() {
            Some(slot) => {
                slot(value);
                true
            }
            None => false,
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(
            live = slots.len(),
            pruned = before - slots.len(),
            "signal emitted"
        );
    }

    /// Whether `connection` still has an entry in this signal.
    #[must_use]
    pub fn is_connected(&self, connection: &Connection<T>) -> bool {
        self.slots.lock().iter().any(|entry| connection.is_slot(entry))
    }

    /// Number of registry entries, including dead ones not yet pruned.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether the registry has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slot_count", &self.slots.lock().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
