#![forbid(unsafe_code)]

//! Host environment adapter.
//!
//! [`Environment`] is the only way the UI state engines touch the outside
//! world. A browser host maps it onto the DOM and `localStorage`; the
//! headless harness maps it onto an in-memory element tree and a virtual
//! clock.
//!
//! # Contract
//!
//! - All methods take `&self`. Implementations use interior mutability so
//!   that callbacks (timers, key listeners) may call back into the
//!   environment while it is dispatching.
//! - Key listeners are invoked in registration order over a snapshot of the
//!   registered set. A listener removed during dispatch may still see the
//!   event currently being dispatched, but never a later one.
//! - A timer callback runs at most once. Cancelling a timer that already
//!   fired, or was already cancelled, is a no-op.
//! - `focus` on an element that is not in the tree returns `false` and leaves
//!   focus unchanged.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::element::ElementId;
use crate::event::KeyEvent;
use crate::storage::StorageError;

/// Whether a key listener consumed a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDisposition {
    /// Let the host run its default behavior (and later listeners).
    #[default]
    Ignored,
    /// Suppress the host's default behavior for this press.
    Handled,
}

impl KeyDisposition {
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// A registered key-press listener.
pub type KeyListener = Rc<dyn Fn(&KeyEvent) -> KeyDisposition>;

/// A one-shot delayed callback.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Handle for a registered key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The host presentation environment.
pub trait Environment {
    // --- Focus ---

    /// The currently focused element, if any.
    fn focused(&self) -> Option<ElementId>;

    /// Move focus to `element`. Returns `false` if the element does not exist.
    fn focus(&self, element: ElementId) -> bool;

    /// Clear focus entirely.
    fn blur(&self);

    /// Whether `element` is still attached to the presentation tree.
    fn contains(&self, element: ElementId) -> bool;

    /// Focusable descendants of `root` in tab order. `root` itself is excluded.
    fn focusable_descendants(&self, root: ElementId) -> Vec<ElementId>;

    // --- Presentation attributes ---

    /// Write an attribute on the root presentation context.
    fn set_attribute(&self, name: &str, value: &str);

    /// Read an attribute from the root presentation context.
    fn attribute(&self, name: &str) -> Option<String>;

    // --- Durable storage ---

    /// Read a durable value. Unreadable storage is reported as absent.
    fn read_storage(&self, key: &str) -> Option<String>;

    /// Write a durable value.
    fn write_storage(&self, key: &str, value: &str) -> Result<(), StorageError>;

    // --- Timers ---

    /// Run `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a pending timer. No-op if it already fired or was cancelled.
    fn cancel(&self, timer: TimerId);

    // --- Keyboard ---

    /// Register a document-wide key listener.
    fn add_key_listener(&self, listener: KeyListener) -> ListenerId;

    /// Deregister a key listener. Returns `false` if it was not registered.
    fn remove_key_listener(&self, listener: ListenerId) -> bool;

    // --- Document side effects ---

    /// Block (or release) scrolling of the content behind a modal.
    fn set_scroll_locked(&self, locked: bool);
}
