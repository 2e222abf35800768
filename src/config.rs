use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "BUNREI_GEMINI_BASE_URL";
pub const GENERATION_MODEL_ENV: &str = "BUNREI_GENERATION_MODEL";
pub const LIVENESS_MODEL_ENV: &str = "BUNREI_LIVENESS_MODEL";
pub const TIMEOUT_ENV: &str = "BUNREI_HTTP_TIMEOUT_SECS";
pub const SETTINGS_DIR_ENV: &str = "BUNREI_SETTINGS_DIR";
pub const EXTRA_KEYS_ENV: &str = "BUNREI_GEMINI_KEYS";
pub const LOG_ENV: &str = "BUNREI_LOG";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_LIVENESS_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub base_url: String,
    pub generation_model: String,
    pub liveness_model: String,
    pub timeout: Duration,
    pub settings_dir: PathBuf,
    /// Credentials appended after the persisted ones in every rotation pool.
    pub extra_credentials: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            liveness_model: DEFAULT_LIVENESS_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            settings_dir: default_settings_dir(),
            extra_credentials: Vec::new(),
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut cfg = CoreConfig::default();

        if let Some(v) = get(BASE_URL_ENV) {
            cfg.base_url = v;
        }
        if let Some(v) = get(GENERATION_MODEL_ENV) {
            cfg.generation_model = v;
        }
        if let Some(v) = get(LIVENESS_MODEL_ENV) {
            cfg.liveness_model = v;
        }
        if let Some(v) = get(TIMEOUT_ENV) {
            match v.parse::<u64>() {
                Ok(secs) => {
                    cfg.timeout =
                        Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS));
                }
                Err(_) => {
                    tracing::warn!("ignoring {TIMEOUT_ENV}={v:?}: not a number of seconds");
                }
            }
        }
        if let Some(v) = get(SETTINGS_DIR_ENV) {
            cfg.settings_dir = PathBuf::from(v);
        }
        if let Some(v) = get(EXTRA_KEYS_ENV) {
            cfg.extra_credentials = v
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }

        cfg
    }
}

fn default_settings_dir() -> PathBuf {
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        return PathBuf::from(local).join("Bunrei");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".bunrei")
}
