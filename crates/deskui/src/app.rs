#![forbid(unsafe_code)]

//! Composition root.
//!
//! [`Services`] builds the three engines against one [`Environment`] and
//! wires them together: the notification broker follows the reduced-motion
//! preference of the settings store.

use std::path::Path;
use std::rc::Rc;

use deskui_core::Environment;
use deskui_runtime::{RuntimeConfig, SettingsStore, Subscription, ToastBroker};
use deskui_widgets::{FocusTrap, ToastContainer};

use crate::InitError;

/// Load configuration from an optional TOML file, then apply `DESKUI_*`
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, InitError> {
    let config = match path {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// The application's UI state services.
///
/// Construct one at startup and hand clones of the individual services to
/// the screens that need them.
pub struct Services {
    env: Rc<dyn Environment>,
    modal: FocusTrap,
    toasts: ToastBroker,
    settings: SettingsStore,
    _motion: Subscription,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("modal", &self.modal)
            .field("toasts", &self.toasts)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Services {
    /// Build every service against `env`.
    ///
    /// Settings are loaded (and projected) first so the broker starts with
    /// the persisted reduced-motion preference.
    pub fn new(env: Rc<dyn Environment>, config: &RuntimeConfig) -> Self {
        let settings = SettingsStore::load(Rc::clone(&env), &config.settings);
        let toasts = ToastBroker::new(Rc::clone(&env), config.toasts.clone());
        toasts.set_reduced_motion(settings.get().reduced_motion);

        let broker = toasts.clone();
        let motion = settings.subscribe(move |s| broker.set_reduced_motion(s.reduced_motion));

        let modal = FocusTrap::new(Rc::clone(&env));
        tracing::debug!(
            storage_key = settings.key(),
            reduced_motion = settings.get().reduced_motion,
            "services started"
        );
        Self {
            env,
            modal,
            toasts,
            settings,
            _motion: motion,
        }
    }

    #[must_use]
    pub fn env(&self) -> &Rc<dyn Environment> {
        &self.env
    }

    #[must_use]
    pub fn modal(&self) -> &FocusTrap {
        &self.modal
    }

    #[must_use]
    pub fn toasts(&self) -> &ToastBroker {
        &self.toasts
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// A toast container bound to this application's broker.
    #[must_use]
    pub fn toast_container(&self) -> ToastContainer {
        ToastContainer::new(self.toasts.clone())
    }

    /// Tear down at shutdown: close any open dialog and drop every toast.
    pub fn dispose(&self) {
        self.modal.dispose();
        self.toasts.clear();
        tracing::debug!("services disposed");
    }
}
