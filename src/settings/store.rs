//! Durable key-value storage for persisted settings
//!
//! Values are opaque strings. [`JsonFileStore`] keeps them in a single JSON
//! object on disk; [`MemoryStore`] keeps them in process.

use crate::error::{RemovalError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Environment variable overriding the settings directory
pub const CONFIG_DIR_ENV: &str = "SNAPCUT_CONFIG_DIR";

const SETTINGS_FILE: &str = "settings.json";

/// String key-value storage that survives process restarts
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Human-readable location, for diagnostics
    fn location(&self) -> String;
}

/// Settings stored as one JSON object in a file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Store backed by an explicit file path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store at the platform settings location
    ///
    /// Uses `$SNAPCUT_CONFIG_DIR/settings.json` when set, otherwise
    /// `<config_dir>/snapcut/settings.json`.
    ///
    /// # Errors
    /// - No configuration directory can be determined for this platform
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?.join(SETTINGS_FILE)))
    }

    fn default_dir() -> Result<PathBuf> {
        if let Ok(dir_override) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir_override));
        }

        Ok(dirs::config_dir()
            .ok_or_else(|| {
                RemovalError::invalid_config(format!(
                    "Failed to determine configuration directory. Set {} environment variable.",
                    CONFIG_DIR_ENV
                ))
            })?
            .join("snapcut"))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(RemovalError::file_io_error("read settings", &self.path, &e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            RemovalError::persistence(format!(
                "Corrupt settings file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RemovalError::file_io_error("create settings directory", parent, &e)
            })?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| RemovalError::persistence(format!("Failed to encode settings: {}", e)))?;

        // Write next to the target and rename so readers never see a torn file
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| RemovalError::file_io_error("write settings", &temp_path, &e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| RemovalError::file_io_error("replace settings", &self.path, &e))?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = match self.read_all().await {
            Ok(values) => values,
            Err(RemovalError::Persistence(msg)) => {
                log::warn!("Replacing unreadable settings: {}", msg);
                BTreeMap::new()
            },
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
