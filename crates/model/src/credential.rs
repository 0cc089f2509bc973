//! Credential resolution.
//!
//! The API key lives in a key/value settings store when the user supplied one
//! and otherwise falls back to a process default captured at startup. The
//! resolver is handed to each client at construction time.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{ModelError, ModelResult};

/// Settings key holding the user-supplied API key.
pub const API_KEY_SETTING: &str = "gemini_api_key";

/// Environment variable consulted for the default key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Settings,
    Environment,
}

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Flat JSON object on disk, rewritten on every change.
pub struct FileSettingsStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileSettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .context(format!("Failed to read settings file: {:?}", path))?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)
                    .context(format!("Failed to parse settings file: {:?}", path))?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context(format!("Failed to create settings directory: {:?}", parent))?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)
            .context(format!("Failed to write settings file: {:?}", self.path))?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        self.persist(&values)
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    settings: Arc<dyn SettingsStore>,
    default_key: Option<String>,
}

impl CredentialResolver {
    pub fn new(settings: Arc<dyn SettingsStore>, default_key: Option<String>) -> Self {
        Self {
            settings,
            default_key,
        }
    }

    /// Resolver whose default comes from `GEMINI_API_KEY`.
    pub fn from_env(settings: Arc<dyn SettingsStore>) -> Self {
        Self::new(settings, std::env::var(API_KEY_ENV).ok())
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    pub fn resolve(&self) -> ModelResult<Credential> {
        self.resolve_with_source().map(|(credential, _)| credential)
    }

    pub fn resolve_with_source(&self) -> ModelResult<(Credential, CredentialSource)> {
        if let Some(key) = non_blank(self.settings.get(API_KEY_SETTING)) {
            return Ok((Credential(key), CredentialSource::Settings));
        }
        if let Some(key) = non_blank(self.default_key.clone()) {
            return Ok((Credential(key), CredentialSource::Environment));
        }
        Err(ModelError::MissingCredential)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
