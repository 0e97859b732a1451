//! Build-time configuration for the API endpoint with runtime overrides. The
//! runtime values come from command-line flags or their environment variables
//! so one binary can target different deployments without rebuilding.
//! Configuration values are public; do not store secrets here.

use crate::errors::AppError;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

/// API base used when nothing is configured at build time or at runtime.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
/// Per-request transport timeout applied unless overridden.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const STORE_DIR: &str = ".admin-console";
const STORE_FILE: &str = "credentials.json";

/// Console configuration derived from build-time variables and runtime overrides.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub store_path: PathBuf,
    /// `None` disables the transport timeout.
    pub timeout: Option<Duration>,
}

/// Values supplied at runtime; blank strings are treated as absent.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
    pub store_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads build-time defaults, applies runtime overrides and validates the base URL.
    ///
    /// # Errors
    /// Returns `AppError::Config` when the resulting base URL is not an absolute
    /// http(s) URL.
    pub fn load(runtime: RuntimeConfig) -> Result<Self, AppError> {
        let api_base_url = option_env!("ADMIN_CONSOLE_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL);

        let mut config = Self {
            api_base_url: api_base_url.to_string(),
            store_path: default_store_path(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        apply_runtime_overrides(&mut config, runtime);
        validate_base_url(&config.api_base_url)?;

        Ok(config)
    }
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url.as_deref().and_then(normalize_runtime_value) {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.store_path.as_deref().and_then(normalize_runtime_value) {
        config.store_path = PathBuf::from(value);
    }
    if let Some(secs) = runtime.timeout_secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn validate_base_url(value: &str) -> Result<(), AppError> {
    let url = Url::parse(value)
        .map_err(|err| AppError::Config(format!("Invalid API base URL {value}: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Config(format!(
                "Invalid API base URL {value}: unsupported scheme {scheme}"
            )))
        }
    }

    if url.host().is_none() {
        return Err(AppError::Config(format!(
            "Invalid API base URL {value}: no host specified"
        )));
    }

    Ok(())
}

fn default_store_path() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(STORE_DIR)
        .join(STORE_FILE)
}
