#![forbid(unsafe_code)]

//! Focus-trap modal controller.
//!
//! [`FocusTrap`] runs at most one modal session at a time. A session moves
//! through `Closed → Opening → Open → Closing → Closed`:
//!
//! | Transition | Side effects |
//! |------------|--------------|
//! | `Closed → Opening` | remember the focused element |
//! | `Opening → Open` | compute the focus ring, focus into the modal, register the key listener, lock background scroll |
//! | `Open → Closing` | deregister the key listener, release the scroll lock |
//! | `Closing → Closed` | restore the remembered focus (or blur), run the close callback |
//!
//! # Invariants
//!
//! 1. Every entry side effect is torn down exactly once per session, on every
//!    exit path: [`FocusTrap::close`], escape, overlay dismissal,
//!    [`FocusTrap::dispose`], a dropped [`DialogGuard`], or the last handle
//!    being dropped.
//! 2. The remembered focus is captured before any focus movement and consumed
//!    exactly once.
//! 3. While open, tab presses never move focus to an element outside the
//!    modal.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | `open` while a session is active | `Err(ModalError::AlreadyOpen)`, active session untouched |
//! | `open` with a root not in the document | `Err(ModalError::MissingRoot)` |
//! | Remembered element gone at close | focus left unset |
//! | `close` with no session | returns `false` |
//! | Ring entry removed while open | tab falls back to the modal root |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use deskui_core::{ElementId, Environment, KeyDisposition, KeyEvent, ListenerId};

use super::guard::DialogGuard;
use super::ring::{TabOutcome, contain_tab};

/// Global counter for unique dialog ids.
static DIALOG_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of one modal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

impl DialogId {
    fn next() -> Self {
        Self(DIALOG_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog-{}", self.0)
    }
}

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrapPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Where focus goes when a session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialFocus {
    /// The modal root itself.
    #[default]
    Root,
    /// The first focusable descendant, or the root if there is none.
    FirstFocusable,
    /// A specific element, or the root if it is not in the document.
    Element(ElementId),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// [`FocusTrap::close`], [`FocusTrap::close_id`], or a dropped guard.
    Requested,
    /// The user pressed escape.
    Escape,
    /// [`FocusTrap::dismiss_overlay`].
    Overlay,
    /// [`FocusTrap::dispose`] or the controller was dropped.
    Disposed,
}

/// Errors from [`FocusTrap::open`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    #[error("a modal session is already open ({active})")]
    AlreadyOpen { active: DialogId },
    #[error("modal root {root} is not in the document")]
    MissingRoot { root: ElementId },
}

type CloseCallback = Box<dyn FnOnce(DialogId, CloseReason)>;

/// Options for one modal session.
pub struct ModalOptions {
    pub initial_focus: InitialFocus,
    pub close_on_escape: bool,
    pub close_on_overlay: bool,
    pub lock_scroll: bool,
    on_close: Option<CloseCallback>,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            initial_focus: InitialFocus::Root,
            close_on_escape: true,
            close_on_overlay: true,
            lock_scroll: true,
            on_close: None,
        }
    }
}

impl fmt::Debug for ModalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalOptions")
            .field("initial_focus", &self.initial_focus)
            .field("close_on_escape", &self.close_on_escape)
            .field("close_on_overlay", &self.close_on_overlay)
            .field("lock_scroll", &self.lock_scroll)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ModalOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn initial_focus(mut self, initial_focus: InitialFocus) -> Self {
        self.initial_focus = initial_focus;
        self
    }

    #[must_use]
    pub fn close_on_escape(mut self, enabled: bool) -> Self {
        self.close_on_escape = enabled;
        self
    }

    #[must_use]
    pub fn close_on_overlay(mut self, enabled: bool) -> Self {
        self.close_on_overlay = enabled;
        self
    }

    #[must_use]
    pub fn lock_scroll(mut self, enabled: bool) -> Self {
        self.lock_scroll = enabled;
        self
    }

    /// Run `callback` once the session has fully closed.
    #[must_use]
    pub fn on_close(mut self, callback: impl FnOnce(DialogId, CloseReason) + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }
}

struct Session {
    id: DialogId,
    root: ElementId,
    saved_focus: Option<ElementId>,
    ring: Vec<ElementId>,
    listener: Option<ListenerId>,
    scroll_locked: bool,
    close_on_escape: bool,
    close_on_overlay: bool,
    on_close: Option<CloseCallback>,
}

#[derive(Default)]
struct TrapState {
    phase: TrapPhase,
    session: Option<Session>,
}

struct TrapShared {
    env: Rc<dyn Environment>,
    state: RefCell<TrapState>,
}

impl Drop for TrapShared {
    fn drop(&mut self) {
        let Some(mut session) = self.state.get_mut().session.take() else {
            return;
        };
        release(self.env.as_ref(), &mut session);
        self.state.get_mut().phase = TrapPhase::Closed;
        tracing::debug!(dialog = %session.id, reason = ?CloseReason::Disposed, "dialog closed on drop");
        if let Some(callback) = session.on_close.take() {
            callback(session.id, CloseReason::Disposed);
        }
    }
}

/// Tear down a session's side effects in reverse order of setup.
fn release(env: &dyn Environment, session: &mut Session) {
    if let Some(listener) = session.listener.take() {
        env.remove_key_listener(listener);
    }
    if std::mem::take(&mut session.scroll_locked) {
        env.set_scroll_locked(false);
    }
    match session.saved_focus.take() {
        Some(saved) if env.contains(saved) => {
            env.focus(saved);
        }
        _ => env.blur(),
    }
    session.ring.clear();
}

/// Single-session focus-trap modal controller.
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct FocusTrap {
    shared: Rc<TrapShared>,
}

impl fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("FocusTrap")
            .field("phase", &state.phase)
            .field("active", &state.session.as_ref().map(|s| s.id))
            .finish()
    }
}

impl FocusTrap {
    #[must_use]
    pub fn new(env: Rc<dyn Environment>) -> Self {
        Self {
            shared: Rc::new(TrapShared {
                env,
                state: RefCell::new(TrapState::default()),
            }),
        }
    }

    // --- Lifecycle ---

    /// Open a session rooted at `root`.
    pub fn open(&self, root: ElementId, options: ModalOptions) -> Result<DialogId, ModalError> {
        let env = &self.shared.env;
        if let Some(active) = self.active_id() {
            tracing::debug!(%active, %root, "dialog open rejected: session active");
            return Err(ModalError::AlreadyOpen { active });
        }
        if !env.contains(root) {
            tracing::debug!(%root, "dialog open rejected: root missing");
            return Err(ModalError::MissingRoot { root });
        }

        // Closed → Opening
        let id = DialogId::next();
        {
            let mut state = self.shared.state.borrow_mut();
            state.phase = TrapPhase::Opening;
            state.session = Some(Session {
                id,
                root,
                saved_focus: env.focused(),
                ring: Vec::new(),
                listener: None,
                scroll_locked: false,
                close_on_escape: options.close_on_escape,
                close_on_overlay: options.close_on_overlay,
                on_close: options.on_close,
            });
        }

        // Opening → Open
        let ring = env.focusable_descendants(root);
        let target = match options.initial_focus {
            InitialFocus::Root => root,
            InitialFocus::FirstFocusable => ring.first().copied().unwrap_or(root),
            InitialFocus::Element(element) if env.contains(element) => element,
            InitialFocus::Element(_) => root,
        };
        if !env.focus(target) {
            env.focus(root);
        }
        let weak: Weak<TrapShared> = Rc::downgrade(&self.shared);
        let listener = env.add_key_listener(Rc::new(move |event: &KeyEvent| {
            match weak.upgrade() {
                Some(shared) => FocusTrap { shared }.handle_key(event),
                None => KeyDisposition::Ignored,
            }
        }));
        if options.lock_scroll {
            env.set_scroll_locked(true);
        }

        let ring_len = ring.len();
        {
            let mut state = self.shared.state.borrow_mut();
            if let Some(session) = state.session.as_mut() {
                session.ring = ring;
                session.listener = Some(listener);
                session.scroll_locked = options.lock_scroll;
            }
            state.phase = TrapPhase::Open;
        }
        tracing::debug!(dialog = %id, %root, focus = %target, ring = ring_len, "dialog opened");
        Ok(id)
    }

    /// Open a session whose lifetime is tied to the returned guard.
    pub fn open_scoped(
        &self,
        root: ElementId,
        options: ModalOptions,
    ) -> Result<DialogGuard, ModalError> {
        let id = self.open(root, options)?;
        Ok(DialogGuard::new(self.clone(), id))
    }

    /// Close the active session. Returns `false` if none is open.
    pub fn close(&self) -> bool {
        self.close_with(None, CloseReason::Requested)
    }

    /// Close the session only if `id` is the active one.
    pub fn close_id(&self, id: DialogId) -> bool {
        self.close_with(Some(id), CloseReason::Requested)
    }

    /// Close in response to a click on the backdrop, if the session allows it.
    pub fn dismiss_overlay(&self) -> bool {
        let allowed = self
            .shared
            .state
            .borrow()
            .session
            .as_ref()
            .is_some_and(|s| s.close_on_overlay);
        allowed && self.close_with(None, CloseReason::Overlay)
    }

    /// Close the active session as part of owner teardown.
    pub fn dispose(&self) {
        self.close_with(None, CloseReason::Disposed);
    }

    /// Recompute the focus ring after the modal's content changed.
    ///
    /// Returns the new ring length, or `None` if no session is open.
    pub fn refresh_focus_ring(&self) -> Option<usize> {
        let root = self.owner()?;
        let ring = self.shared.env.focusable_descendants(root);
        let len = ring.len();
        let mut state = self.shared.state.borrow_mut();
        let session = state.session.as_mut()?;
        session.ring = ring;
        tracing::trace!(dialog = %session.id, ring = len, "focus ring refreshed");
        Some(len)
    }

    fn close_with(&self, only: Option<DialogId>, reason: CloseReason) -> bool {
        // Open → Closing
        let mut session = {
            let mut state = self.shared.state.borrow_mut();
            match &state.session {
                Some(active) if only.is_none_or(|id| id == active.id) => {}
                _ => return false,
            }
            state.phase = TrapPhase::Closing;
            match state.session.take() {
                Some(session) => session,
                None => return false,
            }
        };

        // Closing → Closed
        release(self.shared.env.as_ref(), &mut session);
        self.shared.state.borrow_mut().phase = TrapPhase::Closed;
        tracing::debug!(dialog = %session.id, ?reason, "dialog closed");

        if let Some(callback) = session.on_close.take() {
            callback(session.id, reason);
        }
        true
    }

    // --- Keyboard ---

    /// React to a key press while a session is open.
    pub fn handle_key(&self, event: &KeyEvent) -> KeyDisposition {
        if !event.is_press() {
            return KeyDisposition::Ignored;
        }
        let (root, ring, close_on_escape) = {
            let state = self.shared.state.borrow();
            if state.phase != TrapPhase::Open {
                return KeyDisposition::Ignored;
            }
            let Some(session) = state.session.as_ref() else {
                return KeyDisposition::Ignored;
            };
            (session.root, session.ring.clone(), session.close_on_escape)
        };

        if event.is_escape() {
            if !close_on_escape {
                return KeyDisposition::Ignored;
            }
            self.close_with(None, CloseReason::Escape);
            return KeyDisposition::Handled;
        }
        if !event.is_tab() {
            return KeyDisposition::Ignored;
        }

        let env = &self.shared.env;
        match contain_tab(&ring, env.focused(), event.is_backward_tab()) {
            TabOutcome::Default => KeyDisposition::Ignored,
            TabOutcome::MoveTo(target) => {
                if !env.focus(target) {
                    tracing::trace!(%target, "ring entry gone, holding focus on root");
                    env.focus(root);
                }
                KeyDisposition::Handled
            }
            TabOutcome::Hold => {
                env.focus(root);
                KeyDisposition::Handled
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn phase(&self) -> TrapPhase {
        self.shared.state.borrow().phase
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase() == TrapPhase::Open
    }

    #[must_use]
    pub fn active_id(&self) -> Option<DialogId> {
        self.shared.state.borrow().session.as_ref().map(|s| s.id)
    }

    /// Root element of the active session.
    #[must_use]
    pub fn owner(&self) -> Option<ElementId> {
        self.shared.state.borrow().session.as_ref().map(|s| s.root)
    }

    /// Focusable descendants of the active session, in document order.
    #[must_use]
    pub fn focus_ring(&self) -> Vec<ElementId> {
        self.shared
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.ring.clone())
            .unwrap_or_default()
    }

    /// Element focus returns to when the active session closes.
    #[must_use]
    pub fn saved_focus(&self) -> Option<ElementId> {
        self.shared
            .state
            .borrow()
            .session
            .as_ref()
            .and_then(|s| s.saved_focus)
    }
}
