use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::model::settings::{DisplayOptions, VoiceSelection};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingsKey {
    Credentials,
    Topics,
    Voices,
    Options,
}

impl SettingsKey {
    pub fn name(self) -> &'static str {
        match self {
            SettingsKey::Credentials => "credentials",
            SettingsKey::Topics => "topics",
            SettingsKey::Voices => "voices",
            SettingsKey::Options => "options",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings value for '{key}': {source}")]
    Json {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Get/set string store keyed by fixed names. Values are JSON text.
pub trait SettingsStore {
    fn load(&self, key: SettingsKey) -> Result<Option<String>, StoreError>;
    fn save(&self, key: SettingsKey, value: &str) -> Result<(), StoreError>;
}

fn load_json<T: DeserializeOwned>(
    store: &dyn SettingsStore,
    key: SettingsKey,
) -> Result<Option<T>, StoreError> {
    match store.load(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Json {
                key: key.name(),
                source,
            }),
    }
}

fn save_json<T: Serialize + ?Sized>(
    store: &dyn SettingsStore,
    key: SettingsKey,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Json {
        key: key.name(),
        source,
    })?;
    store.save(key, &raw)
}

pub fn load_credentials(store: &dyn SettingsStore) -> Result<Vec<String>, StoreError> {
    Ok(load_json(store, SettingsKey::Credentials)?.unwrap_or_default())
}

pub fn save_credentials(store: &dyn SettingsStore, keys: &[String]) -> Result<(), StoreError> {
    save_json(store, SettingsKey::Credentials, keys)
}

pub fn load_topics(store: &dyn SettingsStore) -> Result<Vec<String>, StoreError> {
    Ok(load_json(store, SettingsKey::Topics)?.unwrap_or_default())
}

pub fn save_topics(store: &dyn SettingsStore, topics: &[String]) -> Result<(), StoreError> {
    save_json(store, SettingsKey::Topics, topics)
}

pub fn load_options(store: &dyn SettingsStore) -> Result<DisplayOptions, StoreError> {
    Ok(load_json(store, SettingsKey::Options)?.unwrap_or_default())
}

pub fn save_options(store: &dyn SettingsStore, options: &DisplayOptions) -> Result<(), StoreError> {
    save_json(store, SettingsKey::Options, options)
}

pub fn load_voices(store: &dyn SettingsStore) -> Result<VoiceSelection, StoreError> {
    Ok(load_json(store, SettingsKey::Voices)?.unwrap_or_default())
}

pub fn save_voices(store: &dyn SettingsStore, voices: &VoiceSelection) -> Result<(), StoreError> {
    save_json(store, SettingsKey::Voices, voices)
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<BTreeMap<&'static str, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: SettingsKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.borrow().get(key.name()).cloned())
    }

    fn save(&self, key: SettingsKey, value: &str) -> Result<(), StoreError> {
        self.values
            .borrow_mut()
            .insert(key.name(), value.to_string());
        Ok(())
    }
}

/// All keys in one JSON object file, rewritten atomically on every save.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        FileSettingsStore {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_str(&data) {
            Ok(map) => Ok(map),
            Err(e) => {
                // A corrupt file must not lock the user out; start over.
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable settings file");
                Ok(BTreeMap::new())
            }
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: SettingsKey) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key.name()))
    }

    fn save(&self, key: SettingsKey, value: &str) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(key.name().to_string(), value.to_string());

        let json = serde_json::to_string_pretty(&all).map_err(|source| StoreError::Json {
            key: key.name(),
            source,
        })?;

        write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp, bytes)?;

    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => SETTINGS_FILE.to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
