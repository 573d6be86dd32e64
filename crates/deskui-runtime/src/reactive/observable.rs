#![forbid(unsafe_code)]

//! Shared, version-tracked value with change notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::registry::{SubscriberRegistry, Subscription};

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: SubscriberRegistry<T>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Clones share the same value. Replacement is atomic from a reader's point
/// of view: `get()` returns either the old or the new value, never a mix.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: SubscriberRegistry::new(),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// `f` must not call [`Observable::set`] on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Replace the value and notify subscribers. Returns `false` (and
    /// notifies nobody) if `value` equals the current one.
    ///
    /// A subscriber that calls `set` again does not recurse: the running
    /// notification hands the newer value to every subscriber once the
    /// current callback returns.
    pub fn set(&self, value: T) -> bool {
        if !self.replace(value) {
            return false;
        }
        self.notify();
        true
    }

    /// Replace the value without notifying. Returns `false` if `value`
    /// equals the current one.
    ///
    /// Pair with [`Observable::notify`] when work has to happen between the
    /// swap and the broadcast.
    pub fn replace(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        true
    }

    /// Hand the current value to every subscriber.
    pub fn notify(&self) -> usize {
        self.inner.subscribers.notify(|| self.get())
    }

    /// Replace the value with `f(current)`.
    ///
    /// `f` runs on a copy, so it may read or set this observable.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.get());
        self.set(next)
    }

    /// Number of changes applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Subscribe to changes. Current value is not replayed.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}
