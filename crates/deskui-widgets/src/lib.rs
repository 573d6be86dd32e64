#![forbid(unsafe_code)]

//! Accessible widgets for deskui.
//!
//! - [`modal`]: the focus-trap modal controller.
//! - [`toast`]: toast presentation bound to a
//!   [`ToastBroker`](deskui_runtime::ToastBroker).

pub mod modal;
pub mod toast;

pub use modal::{
    CloseReason, DialogGuard, DialogId, FocusTrap, InitialFocus, ModalError, ModalOptions,
    TrapPhase,
};
pub use toast::{ToastContainer, ToastView};
