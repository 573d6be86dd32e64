#![forbid(unsafe_code)]

//! Key-press events delivered by the host environment.
//!
//! Only the keys the UI state engines care about get a dedicated variant;
//! everything else is carried as [`KeyCode::Char`] or [`KeyCode::Other`] so
//! hosts can forward raw presses without filtering them first.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Identity of the pressed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Tab,
    /// Shift+Tab as reported by hosts that fold the modifier into the key.
    BackTab,
    Enter,
    Char(char),
    /// Any other named key, e.g. `"ArrowDown"`.
    Other(String),
}

/// Phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A single key event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain key press with no modifiers.
    #[must_use]
    pub fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// Add modifiers to this event.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn escape() -> Self {
        Self::press(KeyCode::Escape)
    }

    #[must_use]
    pub fn tab() -> Self {
        Self::press(KeyCode::Tab)
    }

    #[must_use]
    pub fn shift_tab() -> Self {
        Self::press(KeyCode::Tab).with_modifiers(Modifiers::SHIFT)
    }

    /// Whether this is a press (or auto-repeat) rather than a release.
    #[must_use]
    pub fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.is_press() && self.code == KeyCode::Escape
    }

    /// Whether this event is a tab press in either direction.
    #[must_use]
    pub fn is_tab(&self) -> bool {
        self.is_press() && matches!(self.code, KeyCode::Tab | KeyCode::BackTab)
    }

    /// Whether a tab press moves backwards (shift held or `BackTab`).
    #[must_use]
    pub fn is_backward_tab(&self) -> bool {
        self.is_tab()
            && (self.code == KeyCode::BackTab || self.modifiers.contains(Modifiers::SHIFT))
    }
}
