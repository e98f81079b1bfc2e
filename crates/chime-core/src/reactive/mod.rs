#![forbid(unsafe_code)]

//! Observer/observable registration and observable values.
//!
//! This module layers two-way subscription bookkeeping on top of
//! [`Signal`](crate::Signal):
//!
//! - [`Observable`]: owns a signal and a map from [`ObserverId`] to the
//!   [`Connection`](crate::Connection) created for that observer.
//! - [`Observer`]: wraps a [`Notify`] target and remembers every observable
//!   it joined. Dropping it unregisters from all of them.
//! - [`ObservableValue`]: a mutex-guarded value that notifies its observers
//!   after each change.
//!
//! # Architecture
//!
//! Identities are opaque process-unique ids, never addresses. An observable
//! keeps the strong side of each observer's forwarding callback; the
//! observer keeps only a `Weak` to the observable, so neither side keeps the
//! other alive.
//!
//! # Invariants
//!
//! 1. At most one connection per observer per observable; registering twice
//!    is a no-op and a single unregister removes it.
//! 2. When `Observer::drop` returns, no observable it was registered with
//!    will invoke its target again, and no invocation is in flight.
//! 3. `ObservableValue::set` emits outside the value lock, with the value it
//!    stored.
//! 4. Under [`ChangePolicy::SkipUnchanged`], setting an equal value is a
//!    no-op (no version bump, no notifications).

pub mod observable;
pub mod observer;
pub mod value;

pub use observable::{Observable, ObservableId};
pub use observer::{Notify, Observer, ObserverId};
pub use value::{ChangePolicy, ObservableValue};
