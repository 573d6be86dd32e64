#![forbid(unsafe_code)]

//! Reactive primitives for deskui.
//!
//! - [`SubscriberRegistry`]: an explicit observer registry mapping stable
//!   tokens to callbacks. Every broadcasting service is built on it.
//! - [`Subscription`]: RAII guard that deregisters its callback on drop.
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification.
//!
//! # Architecture
//!
//! Everything is single-threaded: shared state lives in `Rc<RefCell<..>>`.
//! Notification iterates over a cloned snapshot of the registered callbacks
//! and holds no borrow while a callback runs, so callbacks may subscribe,
//! unsubscribe, or mutate the source without tripping a `RefCell` panic.
//! A mutation made from inside a callback is delivered by the notification
//! already running, after the current callback returns.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A callback removed during a notification cycle receives nothing more,
//!    not even the rest of that cycle.
//! 3. When a notification cycle ends, every callback has last seen the
//!    current value.
//! 4. Subscribing never replays past values.
//! 5. `Observable` version increments exactly once per mutation that changes
//!    the value; setting an equal value is a no-op.

pub mod observable;
pub mod registry;

pub use observable::Observable;
pub use registry::{SubscriberRegistry, Subscription, SubscriptionToken};
