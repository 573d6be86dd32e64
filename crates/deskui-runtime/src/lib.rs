#![forbid(unsafe_code)]

//! Runtime services for deskui.
//!
//! - [`reactive`]: observer registry, RAII subscriptions, and [`Observable`].
//! - [`notify`]: the [`ToastBroker`] notification service.
//! - [`settings`]: the persistent [`SettingsStore`].
//! - [`storage`]: the file-backed [`FileStore`].
//! - [`config`]: [`RuntimeConfig`] loaded from TOML and the environment.
//!
//! All services are single-threaded and cheap to clone; clones share state.

pub mod config;
pub mod notify;
pub mod reactive;
pub mod settings;
pub mod storage;

pub use config::{ConfigError, RuntimeConfig, SettingsConfig, ToastConfig};
pub use notify::{Politeness, ToastBroker, ToastId, ToastItem, ToastKind, ToastOptions};
pub use reactive::{Observable, SubscriberRegistry, Subscription, SubscriptionToken};
pub use settings::{AccessibilitySettings, FontSize, SettingsPatch, SettingsStore};
pub use storage::FileStore;
