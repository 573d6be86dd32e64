#![forbid(unsafe_code)]

//! Tracing subscriber initialization.
//!
//! # Priority (highest to lowest)
//!
//! 1. `DESKUI_LOG` env var (per-target directives, e.g. `deskui_runtime=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. Default level: `info`

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::InitError;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "DESKUI_LOG";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line output on stderr.
    #[default]
    Compact,
    /// One JSON object per event on stderr.
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Install the global subscriber with the default format.
///
/// Returns `Ok(false)` if a global subscriber was already installed, so
/// callers (and tests) may call this more than once.
pub fn init() -> Result<bool, InitError> {
    init_with(LogFormat::default())
}

/// Install the global subscriber with `format`.
pub fn init_with(format: LogFormat) -> Result<bool, InitError> {
    let filter = build_env_filter(|var| std::env::var(var).ok())?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .without_time()
                    .compact(),
            )
            .try_init(),
        #[cfg(feature = "tracing-json")]
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    Ok(installed.is_ok())
}

/// Build an `EnvFilter` from `DESKUI_LOG`, then `RUST_LOG`, then `info`.
///
/// A malformed `DESKUI_LOG` is an error; a malformed `RUST_LOG` is ignored.
fn build_env_filter(lookup: impl Fn(&str) -> Option<String>) -> Result<EnvFilter, InitError> {
    if let Some(directives) = lookup(LOG_ENV) {
        return EnvFilter::try_new(&directives).map_err(|source| InitError::LogFilter {
            directives,
            source,
        });
    }
    if let Some(directives) = lookup("RUST_LOG")
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return Ok(filter);
    }
    Ok(EnvFilter::new("info"))
}
