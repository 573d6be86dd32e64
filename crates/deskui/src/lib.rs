#![forbid(unsafe_code)]

//! deskui: accessible UI state services for a support-ticket client.
//!
//! This crate is the public facade. It re-exports the engines from the
//! workspace crates and adds the pieces an application needs at startup:
//!
//! - [`Services`]: the composition root wiring the focus-trap controller,
//!   notification broker, and settings store to one
//!   [`Environment`](deskui_core::Environment).
//! - [`load_config`]: TOML configuration with `DESKUI_*` overrides.
//! - [`logging::init`]: the `tracing` subscriber, filtered by `DESKUI_LOG`.
//!
//! # Example
//!
//! ```
//! use deskui::prelude::*;
//! use deskui_harness::HeadlessEnvironment;
//!
//! let env = HeadlessEnvironment::shared();
//! let services = Services::new(env.clone(), &RuntimeConfig::default());
//!
//! services.toasts().success("Ticket created");
//! assert_eq!(services.toasts().len(), 1);
//!
//! services.settings().toggle_high_contrast();
//! assert_eq!(env.attribute("data-theme").as_deref(), Some("high-contrast"));
//! ```

pub mod app;
pub mod logging;

pub use app::{Services, load_config};

use deskui_runtime::ConfigError;

/// Errors from application startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid DESKUI_LOG directives {directives:?}: {source}")]
    LogFilter {
        directives: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Common imports for application code.
pub mod prelude {
    pub use crate::{InitError, Services, load_config};
    pub use deskui_core::{ElementId, Environment, KeyEvent};
    pub use deskui_runtime::{
        AccessibilitySettings, FontSize, Politeness, RuntimeConfig, SettingsPatch, SettingsStore,
        Subscription, ToastBroker, ToastId, ToastItem, ToastKind, ToastOptions,
    };
    pub use deskui_widgets::{
        CloseReason, DialogGuard, DialogId, FocusTrap, InitialFocus, ModalError, ModalOptions,
        ToastContainer, ToastView,
    };
}
