#![forbid(unsafe_code)]

//! Accessible modal dialogs.
//!
//! # Focus Management
//!
//! [`FocusTrap`] owns the keyboard and focus side of a modal dialog:
//!
//! - **Focus capture**: the focused element is remembered when a dialog opens
//! - **Initial focus**: the dialog root by default, see [`InitialFocus`]
//! - **Focus trap**: tab and shift+tab wrap at the ends of the focus ring
//! - **Escape to close**: unless disabled per session
//! - **Scroll lock**: background scrolling is locked while open
//! - **Focus restore**: the remembered element is refocused on close
//!
//! Use [`FocusTrap::open_scoped`] to tie a session to a [`DialogGuard`], or
//! [`FocusTrap::open`] and [`FocusTrap::close`] for explicit control.
//!
//! # Example
//!
//! ```
//! use deskui_core::{ElementId, Environment, KeyEvent};
//! use deskui_harness::HeadlessEnvironment;
//! use deskui_widgets::modal::{FocusTrap, ModalOptions};
//!
//! let env = HeadlessEnvironment::shared();
//! env.insert(1, None, true); // "New ticket" button
//! env.insert(10, None, false); // dialog root
//! env.insert(11, Some(10), true); // subject field
//! env.insert(12, Some(10), true); // submit button
//! env.focus(ElementId::new(1));
//!
//! let trap = FocusTrap::new(env.clone());
//! let guard = trap.open_scoped(ElementId::new(10), ModalOptions::new()).unwrap();
//!
//! env.focus(ElementId::new(12));
//! env.press_key(KeyEvent::tab());
//! assert_eq!(env.focused(), Some(ElementId::new(11)));
//!
//! drop(guard);
//! assert_eq!(env.focused(), Some(ElementId::new(1)));
//! ```

mod guard;
mod ring;
mod trap;

pub use guard::DialogGuard;
pub use ring::{TabOutcome, contain_tab};
pub use trap::{
    CloseReason, DialogId, FocusTrap, InitialFocus, ModalError, ModalOptions, TrapPhase,
};
