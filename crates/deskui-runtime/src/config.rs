#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Configuration is plain data: every field has a default, so an empty TOML
//! document (or no file at all) yields a working setup.
//!
//! ```
//! use deskui_runtime::config::RuntimeConfig;
//!
//! let cfg = RuntimeConfig::from_toml_str(r#"
//!     [toasts]
//!     default_duration_ms = 8000
//! "#).unwrap();
//! assert_eq!(cfg.toasts.default_duration_ms, 8000);
//! assert_eq!(cfg.settings.storage_key, "a11y-settings");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ToastConfig::default_duration_ms`].
pub const ENV_TOAST_DURATION_MS: &str = "DESKUI_TOAST_DURATION_MS";
/// Environment variable overriding [`SettingsConfig::storage_key`].
pub const ENV_SETTINGS_KEY: &str = "DESKUI_SETTINGS_KEY";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Settings store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    /// Durable storage key holding the serialized settings record.
    pub storage_key: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            storage_key: "a11y-settings".to_owned(),
        }
    }
}

/// Notification broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToastConfig {
    /// Auto-dismiss delay applied when a publish call gives none.
    pub default_duration_ms: u64,
    /// Exit animation length for user-initiated dismissal.
    pub exit_delay_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5000,
            exit_delay_ms: 200,
        }
    }
}

impl ToastConfig {
    #[must_use]
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }

    #[must_use]
    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub settings: SettingsConfig,
    pub toasts: ToastConfig,
}

impl RuntimeConfig {
    /// Parse from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `DESKUI_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_TOAST_DURATION_MS) {
            self.toasts.default_duration_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: ENV_TOAST_DURATION_MS,
                        value: raw.clone(),
                    })?;
        }
        if let Some(raw) = lookup(ENV_SETTINGS_KEY) {
            let key = raw.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_SETTINGS_KEY,
                    value: raw,
                });
            }
            self.settings.storage_key = key.to_owned();
        }
        Ok(self)
    }
}
