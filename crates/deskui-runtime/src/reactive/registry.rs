#![forbid(unsafe_code)]

//! Token-keyed observer registry.
//!
//! # Failure Modes
//!
//! - `unsubscribe()` with an unknown or already-released token returns
//!   `false` (no panic).
//! - Dropping a [`Subscription`] after its registry is gone is a no-op.
//! - A callback panic propagates to the caller of [`SubscriberRegistry::notify`].
//!
//! # Re-entrancy
//!
//! A `notify` issued from inside a callback does not recurse. It marks the
//! source as changed and returns; the outermost `notify` then makes another
//! pass, handing the current value to every callback that has not seen it
//! yet. Callbacks therefore never end a cycle holding a stale value.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

type Callback<T> = Rc<dyn Fn(&T)>;

/// Stable identity of one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

struct RegistryInner<T: ?Sized> {
    next_token: u64,
    callbacks: BTreeMap<SubscriptionToken, Callback<T>>,
    /// Bumped by every `notify`, nested or not.
    generation: u64,
    notifying: bool,
}

/// Registry of callbacks notified with `&T`.
///
/// Cloning a registry yields another handle to the same set of callbacks.
pub struct SubscriberRegistry<T: ?Sized + 'static> {
    inner: Rc<RefCell<RegistryInner<T>>>,
}

impl<T: ?Sized + 'static> Clone for SubscriberRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized + 'static> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for SubscriberRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl<T: ?Sized + 'static> SubscriberRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                next_token: 1,
                callbacks: BTreeMap::new(),
                generation: 0,
                notifying: false,
            })),
        }
    }

    /// Register `callback`. The returned guard deregisters it on drop.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let token = {
            let mut inner = self.inner.borrow_mut();
            let token = SubscriptionToken(inner.next_token);
            inner.next_token += 1;
            inner.callbacks.insert(token, Rc::new(callback));
            token
        };
        let weak = Rc::downgrade(&self.inner);
        Subscription {
            token,
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().callbacks.remove(&token);
                }
            })),
        }
    }

    /// Deregister by token. Returns `false` if the token is not registered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.borrow_mut().callbacks.remove(&token).is_some()
    }

    /// Invoke every callback, in registration order, with the value read
    /// from `current`.
    ///
    /// `current` is read again before each callback, so a callback that runs
    /// after a nested change sees the changed value. Returns the number of
    /// callback invocations; a nested call returns `0`.
    pub fn notify<V: std::borrow::Borrow<T>>(&self, current: impl Fn() -> V) -> usize {
        let mut generation = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            if inner.notifying {
                return 0;
            }
            inner.notifying = true;
            inner.generation
        };
        let _cycle = CycleGuard(&*self.inner);

        let mut seen: BTreeMap<SubscriptionToken, u64> = BTreeMap::new();
        let mut invoked = 0;
        loop {
            let snapshot: Vec<(SubscriptionToken, Callback<T>)> = self
                .inner
                .borrow()
                .callbacks
                .iter()
                .filter(|(token, _)| seen.get(token) != Some(&generation))
                .map(|(token, callback)| (*token, Rc::clone(callback)))
                .collect();
            for (token, callback) in snapshot {
                let delivered = {
                    let inner = self.inner.borrow();
                    if !inner.callbacks.contains_key(&token) {
                        continue;
                    }
                    inner.generation
                };
                let value = current();
                callback(<V as std::borrow::Borrow<T>>::borrow(&value));
                seen.insert(token, delivered);
                invoked += 1;
            }
            let latest = self.inner.borrow().generation;
            if latest == generation {
                return invoked;
            }
            generation = latest;
        }
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().callbacks.is_empty()
    }

    /// Drop every registered callback.
    pub fn clear(&self) {
        self.inner.borrow_mut().callbacks.clear();
    }
}

/// Ends a notification cycle, also when a callback panics.
struct CycleGuard<'a, T: ?Sized>(&'a RefCell<RegistryInner<T>>);

impl<T: ?Sized> Drop for CycleGuard<'_, T> {
    fn drop(&mut self) {
        self.0.borrow_mut().notifying = false;
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the guard deregisters the callback. Call [`Subscription::detach`]
/// to keep the callback registered for the registry's whole lifetime.
#[must_use = "dropping a Subscription deregisters its callback immediately"]
pub struct Subscription {
    token: SubscriptionToken,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// The token this guard releases.
    #[must_use]
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Deregister now.
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Keep the callback registered after this guard is gone.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("active", &self.release.is_some())
            .finish()
    }
}
