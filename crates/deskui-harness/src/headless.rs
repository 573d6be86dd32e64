#![forbid(unsafe_code)]

//! In-memory [`Environment`] with a virtual clock.
//!
//! # Invariants
//!
//! 1. Document order is insertion order. Children inserted after siblings of
//!    their parent still sort by insertion, which is enough for fixtures.
//! 2. Removing an element removes its whole subtree; if focus was inside the
//!    subtree, focus becomes unset.
//! 3. No internal `RefCell` borrow is held while a timer callback or key
//!    listener runs, so callbacks may re-enter the environment freely.
//! 4. Timers fire in due-time order; ties fire in scheduling order.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use deskui_core::{
    ElementId, Environment, KeyDisposition, KeyEvent, KeyListener, KeyValueStore, ListenerId,
    MemoryStore, StorageError, TimerCallback, TimerId,
};

#[derive(Debug, Clone, Copy)]
struct Node {
    id: ElementId,
    parent: Option<ElementId>,
    focusable: bool,
}

/// Headless host environment for tests and fixtures.
pub struct HeadlessEnvironment {
    nodes: RefCell<Vec<Node>>,
    focused: Cell<Option<ElementId>>,
    attributes: RefCell<BTreeMap<String, String>>,
    store: Rc<dyn KeyValueStore>,
    now: Cell<Duration>,
    /// Pending timers keyed by `(due, id)`.
    timers: RefCell<BTreeMap<(Duration, TimerId), TimerCallback>>,
    timer_due: RefCell<AHashMap<TimerId, Duration>>,
    next_timer: Cell<u64>,
    listeners: RefCell<BTreeMap<ListenerId, KeyListener>>,
    next_listener: Cell<u64>,
    scroll_locked: Cell<bool>,
    scroll_lock_changes: Cell<u32>,
}

impl Default for HeadlessEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessEnvironment")
            .field("elements", &self.nodes.borrow().len())
            .field("focused", &self.focused.get())
            .field("now", &self.now.get())
            .field("pending_timers", &self.timers.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl HeadlessEnvironment {
    /// Empty environment backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Rc::new(MemoryStore::new()))
    }

    /// Empty environment backed by `store`.
    ///
    /// Sharing one store between two environments simulates a process
    /// restart: the second environment sees what the first persisted.
    #[must_use]
    pub fn with_store(store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            focused: Cell::new(None),
            attributes: RefCell::new(BTreeMap::new()),
            store,
            now: Cell::new(Duration::ZERO),
            timers: RefCell::new(BTreeMap::new()),
            timer_due: RefCell::new(AHashMap::new()),
            next_timer: Cell::new(1),
            listeners: RefCell::new(BTreeMap::new()),
            next_listener: Cell::new(1),
            scroll_locked: Cell::new(false),
            scroll_lock_changes: Cell::new(0),
        }
    }

    /// Convenience: `Rc::new(Self::new())`.
    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    // --- Element tree ---

    /// Append an element in document order.
    ///
    /// Returns `false` (and changes nothing) if the id is already present or
    /// `parent` is not in the tree.
    pub fn insert(&self, id: u64, parent: Option<u64>, focusable: bool) -> bool {
        let id = ElementId::new(id);
        let parent = parent.map(ElementId::new);
        let mut nodes = self.nodes.borrow_mut();
        if nodes.iter().any(|n| n.id == id) {
            return false;
        }
        if let Some(p) = parent
            && !nodes.iter().any(|n| n.id == p)
        {
            return false;
        }
        nodes.push(Node {
            id,
            parent,
            focusable,
        });
        true
    }

    /// Remove an element and its subtree. Returns the number of removed nodes.
    pub fn remove(&self, id: u64) -> usize {
        let id = ElementId::new(id);
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.iter().any(|n| n.id == id) {
            return 0;
        }
        let doomed: Vec<ElementId> = nodes
            .iter()
            .filter(|n| n.id == id || is_descendant(&nodes, n.id, id))
            .map(|n| n.id)
            .collect();
        nodes.retain(|n| !doomed.contains(&n.id));
        drop(nodes);

        if let Some(f) = self.focused.get()
            && doomed.contains(&f)
        {
            self.focused.set(None);
        }
        doomed.len()
    }

    /// Number of elements in the tree.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    // --- Keyboard ---

    /// Dispatch a key press to listeners, then apply default tab traversal if
    /// nobody handled it.
    pub fn press_key(&self, event: KeyEvent) -> KeyDisposition {
        let snapshot: Vec<KeyListener> = self.listeners.borrow().values().cloned().collect();
        let mut disposition = KeyDisposition::Ignored;
        for listener in snapshot {
            if listener(&event).is_handled() {
                disposition = KeyDisposition::Handled;
            }
        }
        tracing::trace!(?event, ?disposition, "headless key dispatch");

        if !disposition.is_handled() && event.is_tab() {
            self.default_tab(event.is_backward_tab());
        }
        disposition
    }

    /// Number of registered key listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    // --- Clock ---

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Advance the virtual clock, firing every timer that comes due.
    ///
    /// Returns the number of callbacks that ran.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.now.get() + delta;
        let mut fired = 0;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                match timers.keys().next().copied() {
                    Some(key) if key.0 <= target => timers.remove(&key).map(|cb| (key, cb)),
                    _ => None,
                }
            };
            let Some(((due, id), callback)) = next else {
                break;
            };
            self.timer_due.borrow_mut().remove(&id);
            self.now.set(due);
            callback();
            fired += 1;
        }
        self.now.set(target);
        fired
    }

    /// Convenience: advance by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    /// Number of timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    // --- Document side effects ---

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked.get()
    }

    /// How many times the scroll lock actually changed state.
    #[must_use]
    pub fn scroll_lock_changes(&self) -> u32 {
        self.scroll_lock_changes.get()
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> Rc<dyn KeyValueStore> {
        Rc::clone(&self.store)
    }

    fn doc_index(&self, id: ElementId) -> Option<usize> {
        self.nodes.borrow().iter().position(|n| n.id == id)
    }

    fn default_tab(&self, backward: bool) {
        let nodes = self.nodes.borrow();
        let order: Vec<(usize, ElementId)> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.focusable)
            .map(|(i, n)| (i, n.id))
            .collect();
        drop(nodes);
        if order.is_empty() {
            return;
        }

        let current = self.focused.get().and_then(|f| self.doc_index(f));
        let target = match (current, backward) {
            (None, false) => order[0].1,
            (None, true) => order[order.len() - 1].1,
            (Some(at), false) => order
                .iter()
                .find(|(i, _)| *i > at)
                .unwrap_or(&order[0])
                .1,
            (Some(at), true) => order
                .iter()
                .rev()
                .find(|(i, _)| *i < at)
                .unwrap_or(&order[order.len() - 1])
                .1,
        };
        self.focused.set(Some(target));
    }
}

fn is_descendant(nodes: &[Node], candidate: ElementId, root: ElementId) -> bool {
    let mut cursor = nodes.iter().find(|n| n.id == candidate).and_then(|n| n.parent);
    while let Some(parent) = cursor {
        if parent == root {
            return true;
        }
        cursor = nodes.iter().find(|n| n.id == parent).and_then(|n| n.parent);
    }
    false
}

impl Environment for HeadlessEnvironment {
    fn focused(&self) -> Option<ElementId> {
        self.focused.get()
    }

    fn focus(&self, element: ElementId) -> bool {
        if self.contains(element) {
            self.focused.set(Some(element));
            true
        } else {
            false
        }
    }

    fn blur(&self) {
        self.focused.set(None);
    }

    fn contains(&self, element: ElementId) -> bool {
        self.nodes.borrow().iter().any(|n| n.id == element)
    }

    fn focusable_descendants(&self, root: ElementId) -> Vec<ElementId> {
        let nodes = self.nodes.borrow();
        nodes
            .iter()
            .filter(|n| n.focusable && n.id != root && is_descendant(&nodes, n.id, root))
            .map(|n| n.id)
            .collect()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn read_storage(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    fn write_storage(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.set(key, value)
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId::new(self.next_timer.get());
        self.next_timer.set(id.id() + 1);
        let due = self.now.get() + delay;
        self.timers.borrow_mut().insert((due, id), callback);
        self.timer_due.borrow_mut().insert(id, due);
        id
    }

    fn cancel(&self, timer: TimerId) {
        if let Some(due) = self.timer_due.borrow_mut().remove(&timer) {
            self.timers.borrow_mut().remove(&(due, timer));
        }
    }

    fn add_key_listener(&self, listener: KeyListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get());
        self.next_listener.set(id.id() + 1);
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn remove_key_listener(&self, listener: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&listener).is_some()
    }

    fn set_scroll_locked(&self, locked: bool) {
        if self.scroll_locked.replace(locked) != locked {
            self.scroll_lock_changes
                .set(self.scroll_lock_changes.get() + 1);
        }
    }
}
