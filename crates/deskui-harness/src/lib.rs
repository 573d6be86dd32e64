#![forbid(unsafe_code)]

//! Test harness for deskui.
//!
//! [`HeadlessEnvironment`] implements [`deskui_core::Environment`] entirely in
//! memory: an element tree in document order, a virtual clock that only
//! moves when a test calls [`HeadlessEnvironment::advance`], and key dispatch
//! that falls back to browser-like tab traversal when no listener handles the
//! press.
//!
//! ```
//! use deskui_core::{ElementId, Environment, KeyEvent};
//! use deskui_harness::HeadlessEnvironment;
//!
//! let env = HeadlessEnvironment::shared();
//! env.insert(1, None, true);
//! env.insert(2, None, true);
//! env.focus(ElementId::new(1));
//! env.press_key(KeyEvent::tab());
//! assert_eq!(env.focused(), Some(ElementId::new(2)));
//! ```

pub mod headless;

pub use headless::HeadlessEnvironment;
