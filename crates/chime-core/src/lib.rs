#![forbid(unsafe_code)]

//! Core: thread-safe signals, observers, and observable values.
//!
//! # Role in chime
//! `chime-core` is the publish/subscribe layer. Everything else in the
//! workspace (the `Date` payload, the demo binary) is a consumer of it.
//!
//! # Primary responsibilities
//! - **Signal**: a multicast callback registry holding callbacks weakly.
//! - **Connection**: the handle whose liveness keeps a callback reachable.
//! - **Observer / Observable**: two-way registration bookkeeping so either
//!   side can sever a subscription, and dropping an observer is always safe.
//! - **ObservableValue**: a guarded value that broadcasts changes.
//!
//! # How it fits together
//! [`Signal`] is the only dispatch mechanism. [`Observable`] owns a signal
//! plus a map from [`ObserverId`] to [`Connection`]; an [`Observer`] owns
//! the reverse map so its `Drop` can unregister everywhere. An
//! [`ObservableValue`] embeds an [`Observable`] and emits after each
//! mutation, outside its value lock.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use chime_core::{Notify, ObservableValue, Observer};
//!
//! struct Latest(AtomicI32);
//!
//! impl Notify<i32> for Latest {
//!     fn on_notify(&self, value: &i32) {
//!         self.0.store(*value, Ordering::SeqCst);
//!     }
//! }
//!
//! let value = ObservableValue::new(0);
//! let observer = Observer::new(Latest(AtomicI32::new(0)));
//! observer.register_with(value.observable());
//!
//! value.set(5);
//! assert_eq!(observer.target().0.load(Ordering::SeqCst), 5);
//! ```

pub mod reactive;
pub mod signal;

pub use reactive::{
    ChangePolicy, Notify, Observable, ObservableId, ObservableValue, Observer, ObserverId,
};
pub use signal::{Connection, Signal};
