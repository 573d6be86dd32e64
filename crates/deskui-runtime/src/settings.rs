#![forbid(unsafe_code)]

//! Persistent accessibility settings.
//!
//! [`SettingsStore`] owns the user's accessibility preferences. Every change
//! is written to durable storage and projected onto document attributes
//! before subscribers hear about it, so a subscriber reading the environment
//! always sees the new presentation.
//!
//! # Durable record
//!
//! ```json
//! {"reducedMotion":false,"highContrast":false,"fontSize":"medium"}
//! ```
//!
//! Parsing is strict: a missing field, a wrong type, or an unknown font size
//! rejects the whole record and the defaults are used instead. A record is
//! never partially merged.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | No stored record | defaults, logged at `debug` |
//! | Malformed record | defaults, logged at `warn` |
//! | Storage write fails | in-memory value still changes, logged at `warn` |

use std::fmt;
use std::rc::Rc;

use deskui_core::Environment;
use serde::{Deserialize, Serialize};

use crate::config::SettingsConfig;
use crate::reactive::{Observable, Subscription};

/// Attribute carrying the colour theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";
/// Attribute carrying the font size.
pub const FONT_SIZE_ATTRIBUTE: &str = "data-font-size";
/// Attribute carrying the reduced-motion flag.
pub const REDUCED_MOTION_ATTRIBUTE: &str = "data-reduced-motion";

/// Base text size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilitySettings {
    pub reduced_motion: bool,
    pub high_contrast: bool,
    pub font_size: FontSize,
}

impl AccessibilitySettings {
    /// Parse a durable record. Any defect rejects the whole record.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Value of [`THEME_ATTRIBUTE`].
    #[must_use]
    pub const fn theme(&self) -> &'static str {
        if self.high_contrast {
            "high-contrast"
        } else {
            "default"
        }
    }
}

/// Partial update. `None` fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsPatch {
    pub reduced_motion: Option<bool>,
    pub high_contrast: Option<bool>,
    pub font_size: Option<FontSize>,
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reduced_motion(mut self, on: bool) -> Self {
        self.reduced_motion = Some(on);
        self
    }

    #[must_use]
    pub fn high_contrast(mut self, on: bool) -> Self {
        self.high_contrast = Some(on);
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: FontSize) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn apply(&self, base: AccessibilitySettings) -> AccessibilitySettings {
        AccessibilitySettings {
            reduced_motion: self.reduced_motion.unwrap_or(base.reduced_motion),
            high_contrast: self.high_contrast.unwrap_or(base.high_contrast),
            font_size: self.font_size.unwrap_or(base.font_size),
        }
    }
}

/// Durable, observable accessibility settings.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct SettingsStore {
    state: Observable<AccessibilitySettings>,
    env: Rc<dyn Environment>,
    key: Rc<str>,
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

impl SettingsStore {
    /// Load settings from `env`'s durable storage.
    ///
    /// Never fails: an absent or malformed record yields the defaults. The
    /// loaded snapshot is projected and written back in normalized form.
    pub fn load(env: Rc<dyn Environment>, config: &SettingsConfig) -> Self {
        let key: Rc<str> = Rc::from(config.storage_key.as_str());
        let initial = read_record(env.as_ref(), &key);
        let store = Self {
            state: Observable::new(initial),
            env,
            key,
        };
        store.persist(&initial);
        store.project(&initial);
        tracing::debug!(key = %store.key, settings = ?initial, "settings loaded");
        store
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> AccessibilitySettings {
        self.state.get()
    }

    /// Storage key the record lives under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Apply a partial update and return the new snapshot.
    pub fn update(&self, patch: SettingsPatch) -> AccessibilitySettings {
        self.commit(patch.apply(self.get()))
    }

    pub fn toggle_reduced_motion(&self) -> AccessibilitySettings {
        let current = self.get();
        self.update(SettingsPatch::new().reduced_motion(!current.reduced_motion))
    }

    pub fn toggle_high_contrast(&self) -> AccessibilitySettings {
        let current = self.get();
        self.update(SettingsPatch::new().high_contrast(!current.high_contrast))
    }

    pub fn set_font_size(&self, size: FontSize) -> AccessibilitySettings {
        self.update(SettingsPatch::new().font_size(size))
    }

    /// Restore the defaults.
    pub fn reset(&self) -> AccessibilitySettings {
        self.commit(AccessibilitySettings::default())
    }

    /// Re-read durable storage, for example after another writer changed it.
    pub fn reload(&self) -> AccessibilitySettings {
        self.commit(read_record(self.env.as_ref(), &self.key))
    }

    /// Called with the new snapshot after every change that alters it.
    pub fn subscribe(&self, callback: impl Fn(&AccessibilitySettings) + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Number of changes applied since load.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    fn commit(&self, next: AccessibilitySettings) -> AccessibilitySettings {
        let changed = self.state.replace(next);
        self.persist(&next);
        self.project(&next);
        if changed {
            tracing::debug!(settings = ?next, "settings changed");
            self.state.notify();
        }
        next
    }

    fn persist(&self, settings: &AccessibilitySettings) {
        let raw = match settings.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode settings");
                return;
            }
        };
        if let Err(err) = self.env.write_storage(&self.key, &raw) {
            tracing::warn!(key = %self.key, error = %err, "failed to persist settings");
        }
    }

    fn project(&self, settings: &AccessibilitySettings) {
        self.env.set_attribute(THEME_ATTRIBUTE, settings.theme());
        self.env
            .set_attribute(FONT_SIZE_ATTRIBUTE, settings.font_size.as_str());
        self.env.set_attribute(
            REDUCED_MOTION_ATTRIBUTE,
            if settings.reduced_motion { "true" } else { "false" },
        );
    }
}

fn read_record(env: &dyn Environment, key: &str) -> AccessibilitySettings {
    let Some(raw) = env.read_storage(key) else {
        tracing::debug!(key, "no stored settings, using defaults");
        return AccessibilitySettings::default();
    };
    match AccessibilitySettings::from_json(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(key, error = %err, "corrupt settings record, using defaults");
            AccessibilitySettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskui_core::{KeyValueStore, MemoryStore};
    use deskui_harness::HeadlessEnvironment;
    use std::cell::RefCell;
    use tracing_test::traced_test;

    const KEY: &str = "a11y-settings";

    fn env_with(record: Option<&str>) -> Rc<HeadlessEnvironment> {
        let mut store = MemoryStore::new();
        if let Some(raw) = record {
            store = store.with_entry(KEY, raw);
        }
        Rc::new(HeadlessEnvironment::with_store(Rc::new(store)))
    }

    fn load(env: &Rc<HeadlessEnvironment>) -> SettingsStore {
        SettingsStore::load(env.clone(), &SettingsConfig::default())
    }

    fn attrs(env: &HeadlessEnvironment) -> (String, String, String) {
        (
            env.attribute(THEME_ATTRIBUTE).unwrap_or_default(),
            env.attribute(FONT_SIZE_ATTRIBUTE).unwrap_or_default(),
            env.attribute(REDUCED_MOTION_ATTRIBUTE).unwrap_or_default(),
        )
    }

    // --- Loading ---

    #[test]
    fn missing_record_yields_defaults_and_projects() {
        let env = env_with(None);
        let store = load(&env);
        assert_eq!(store.get(), AccessibilitySettings::default());
        assert_eq!(
            attrs(&env),
            ("default".into(), "medium".into(), "false".into())
        );
        assert_eq!(
            env.read_storage(KEY).as_deref(),
            Some(r#"{"reducedMotion":false,"highContrast":false,"fontSize":"medium"}"#)
        );
    }

    #[test]
    fn valid_record_is_loaded() {
        let env = env_with(Some(
            r#"{"reducedMotion":true,"highContrast":true,"fontSize":"large"}"#,
        ));
        let store = load(&env);
        assert_eq!(
            store.get(),
            AccessibilitySettings {
                reduced_motion: true,
                high_contrast: true,
                font_size: FontSize::Large,
            }
        );
        assert_eq!(
            attrs(&env),
            ("high-contrast".into(), "large".into(), "true".into())
        );
    }

    #[test]
    #[traced_test]
    fn corrupt_record_yields_exact_defaults() {
        let env = env_with(Some("{not json"));
        let store = load(&env);
        assert_eq!(store.get(), AccessibilitySettings::default());
        assert!(logs_contain("corrupt settings record"));
    }

    #[test]
    fn partial_record_is_not_merged() {
        let env = env_with(Some(r#"{"highContrast":true}"#));
        assert_eq!(load(&env).get(), AccessibilitySettings::default());
    }

    #[test]
    fn unknown_font_size_is_rejected() {
        let env = env_with(Some(
            r#"{"reducedMotion":true,"highContrast":false,"fontSize":"huge"}"#,
        ));
        assert_eq!(load(&env).get(), AccessibilitySettings::default());
    }

    #[test]
    fn configured_key_is_used() {
        let env = Rc::new(HeadlessEnvironment::with_store(Rc::new(
            MemoryStore::new().with_entry(
                "prefs",
                r#"{"reducedMotion":true,"highContrast":false,"fontSize":"small"}"#,
            ),
        )));
        let store = SettingsStore::load(
            env.clone(),
            &SettingsConfig {
                storage_key: "prefs".into(),
            },
        );
        assert_eq!(store.key(), "prefs");
        assert_eq!(store.get().font_size, FontSize::Small);
    }

    // --- Mutation ---

    #[test]
    fn mutation_persists_and_projects_before_returning() {
        let env = env_with(None);
        let store = load(&env);
        let next = store.set_font_size(FontSize::Large);
        assert_eq!(next.font_size, FontSize::Large);
        assert_eq!(env.attribute(FONT_SIZE_ATTRIBUTE).as_deref(), Some("large"));
        let persisted = AccessibilitySettings::from_json(&env.read_storage(KEY).unwrap()).unwrap();
        assert_eq!(persisted, next);
    }

    #[test]
    fn double_toggle_high_contrast_restores_theme() {
        let env = env_with(None);
        let store = load(&env);
        assert!(store.toggle_high_contrast().high_contrast);
        assert_eq!(env.attribute(THEME_ATTRIBUTE).as_deref(), Some("high-contrast"));
        assert!(!store.toggle_high_contrast().high_contrast);
        assert_eq!(env.attribute(THEME_ATTRIBUTE).as_deref(), Some("default"));
    }

    #[test]
    fn toggle_reduced_motion_projects_flag() {
        let env = env_with(None);
        let store = load(&env);
        store.toggle_reduced_motion();
        assert_eq!(
            env.attribute(REDUCED_MOTION_ATTRIBUTE).as_deref(),
            Some("true")
        );
    }

    #[test]
    fn update_applies_only_given_fields() {
        let env = env_with(None);
        let store = load(&env);
        store.toggle_reduced_motion();
        let next = store.update(SettingsPatch::new().high_contrast(true));
        assert!(next.reduced_motion);
        assert!(next.high_contrast);
        assert_eq!(next.font_size, FontSize::Medium);
    }

    #[test]
    fn reset_restores_defaults() {
        let env = env_with(None);
        let store = load(&env);
        store.update(
            SettingsPatch::new()
                .reduced_motion(true)
                .high_contrast(true)
                .font_size(FontSize::Small),
        );
        assert_eq!(store.reset(), AccessibilitySettings::default());
        assert_eq!(
            attrs(&env),
            ("default".into(), "medium".into(), "false".into())
        );
    }

    #[test]
    fn round_trip_across_restart() {
        let shared: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let first = Rc::new(HeadlessEnvironment::with_store(Rc::clone(&shared)));
        let store = load(&first);
        store.set_font_size(FontSize::Small);
        store.toggle_high_contrast();
        let saved = store.get();
        drop(store);

        let second = Rc::new(HeadlessEnvironment::with_store(shared));
        assert_eq!(load(&second).get(), saved);
    }

    #[test]
    #[traced_test]
    fn write_failure_is_logged_not_raised() {
        let env = Rc::new(HeadlessEnvironment::with_store(Rc::new(
            MemoryStore::new().read_only(),
        )));
        let store = load(&env);
        let next = store.toggle_high_contrast();
        assert!(next.high_contrast);
        assert_eq!(store.get(), next);
        assert_eq!(env.attribute(THEME_ATTRIBUTE).as_deref(), Some("high-contrast"));
        assert!(logs_contain("failed to persist settings"));
    }

    #[test]
    fn reload_picks_up_external_change() {
        let env = env_with(None);
        let store = load(&env);
        env.write_storage(
            KEY,
            r#"{"reducedMotion":false,"highContrast":true,"fontSize":"medium"}"#,
        )
        .unwrap();
        assert!(store.reload().high_contrast);
        assert_eq!(env.attribute(THEME_ATTRIBUTE).as_deref(), Some("high-contrast"));
    }

    // --- Subscription ---

    #[test]
    fn subscribers_see_projected_environment() {
        let env = env_with(None);
        let store = load(&env);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, e) = (Rc::clone(&seen), Rc::clone(&env));
        let _sub = store.subscribe(move |settings| {
            s.borrow_mut()
                .push((settings.high_contrast, e.attribute(THEME_ATTRIBUTE)));
        });
        store.toggle_high_contrast();
        assert_eq!(
            *seen.borrow(),
            vec![(true, Some("high-contrast".to_owned()))]
        );
    }

    #[test]
    fn unchanged_update_does_not_notify() {
        let env = env_with(None);
        let store = load(&env);
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let _sub = store.subscribe(move |_| *h.borrow_mut() += 1);
        store.set_font_size(FontSize::Medium);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(store.version(), 0);
        store.set_font_size(FontSize::Large);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn subscriber_mutation_reaches_later_subscribers() {
        let env = env_with(None);
        let store = load(&env);
        let writer = store.clone();
        let _enlarge = store.subscribe(move |settings| {
            if settings.high_contrast {
                writer.set_font_size(FontSize::Large);
            }
        });
        let last_font = Rc::new(RefCell::new(None));
        let l = Rc::clone(&last_font);
        let _reader = store.subscribe(move |settings| *l.borrow_mut() = Some(settings.font_size));

        store.toggle_high_contrast();
        assert_eq!(store.get().font_size, FontSize::Large);
        assert_eq!(*last_font.borrow(), Some(FontSize::Large));
        assert_eq!(attrs(&env).1, "large");
        assert_eq!(store.version(), 2);
    }

    /// Durable store that records what the settings store reports while a
    /// write is in progress.
    struct WatchingStore {
        inner: MemoryStore,
        settings: RefCell<Option<SettingsStore>>,
        during_write: RefCell<Vec<AccessibilitySettings>>,
    }

    impl KeyValueStore for WatchingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), deskui_core::StorageError> {
            if let Some(settings) = self.settings.borrow().as_ref() {
                self.during_write.borrow_mut().push(settings.get());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), deskui_core::StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn snapshot_is_replaced_before_persisting() {
        let watcher = Rc::new(WatchingStore {
            inner: MemoryStore::new(),
            settings: RefCell::new(None),
            during_write: RefCell::new(Vec::new()),
        });
        let env = Rc::new(HeadlessEnvironment::with_store(watcher.clone()));
        let store = load(&env);
        *watcher.settings.borrow_mut() = Some(store.clone());

        store.toggle_reduced_motion();
        assert_eq!(watcher.during_write.borrow().len(), 1);
        assert!(watcher.during_write.borrow()[0].reduced_motion);
        watcher.settings.borrow_mut().take();
    }

    #[test]
    fn clones_share_state() {
        let env = env_with(None);
        let a = load(&env);
        let b = a.clone();
        b.toggle_reduced_motion();
        assert!(a.get().reduced_motion);
    }
}
