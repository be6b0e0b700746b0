//! Active provider selection and API credential
//!
//! [`ConfigStore`] is an ordinary value owned by the caller and shared with
//! the removal service through an `Arc`. Storage and memory are only
//! synchronised by explicit `set_credential` / `load_saved_config` calls.

mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore, CONFIG_DIR_ENV};

use crate::error::Result;
use crate::providers::{Provider, ProviderRegistry};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Storage key of the API credential
pub const API_KEY_STORAGE_KEY: &str = "background_removal_api_key";
/// Storage key of the selected provider name
pub const PROVIDER_STORAGE_KEY: &str = "background_removal_provider";

#[derive(Debug, Clone)]
struct Settings {
    active_provider: Provider,
    credential: Option<String>,
}

/// Provider and credential captured at the start of one removal
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    pub provider: Provider,
    pub credential: String,
}

impl fmt::Debug for ActiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveConfig")
            .field("provider", &self.provider.name)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Caller-owned configuration: active provider plus credential
pub struct ConfigStore {
    registry: ProviderRegistry,
    storage: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.read();
        f.debug_struct("ConfigStore")
            .field("storage", &self.storage.location())
            .field("active_provider", &settings.active_provider.name)
            .field("configured", &settings.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConfigStore {
    /// Unconfigured store; the registry's first provider is active
    pub fn new(registry: ProviderRegistry, storage: Arc<dyn KeyValueStore>) -> Self {
        let settings = Settings {
            active_provider: registry.default_provider().clone(),
            credential: None,
        };
        Self {
            registry,
            storage,
            settings: RwLock::new(settings),
        }
    }

    /// Built-in providers with in-memory storage
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(ProviderRegistry::builtin(), Arc::new(MemoryStore::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the credential and, when the name resolves, the active provider
    ///
    /// An unknown `provider_name` keeps the previous provider active. Both the
    /// credential and the active provider name are persisted afterwards.
    ///
    /// # Errors
    /// - Writing either value to storage failed
    pub async fn set_credential(&self, key: &str, provider_name: Option<&str>) -> Result<()> {
        let provider_to_persist = {
            let mut settings = self.write();
            settings.credential = Some(key.to_string());

            if let Some(name) = provider_name {
                match self.registry.find_by_name(name) {
                    Some(provider) => settings.active_provider = provider.clone(),
                    None => warn!(provider = %name, "Unknown provider, keeping current selection"),
                }
            }

            settings.active_provider.name.clone()
        };

        self.storage.set(API_KEY_STORAGE_KEY, key).await?;
        self.storage
            .set(PROVIDER_STORAGE_KEY, &provider_to_persist)
            .await?;

        info!(provider = %provider_to_persist, "Configuration saved");
        Ok(())
    }

    /// Reload persisted values into memory
    ///
    /// Missing values leave the current state untouched. Storage failures are
    /// logged and ignored so startup is never blocked.
    pub async fn load_saved_config(&self) {
        let saved_key = match self.storage.get(API_KEY_STORAGE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Error loading saved API key");
                None
            },
        };
        let saved_provider = match self.storage.get(PROVIDER_STORAGE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Error loading saved provider");
                None
            },
        };

        let mut settings = self.write();
        if let Some(key) = saved_key.filter(|k| !k.is_empty()) {
            settings.credential = Some(key);
        }
        if let Some(name) = saved_provider {
            match self.registry.find_by_name(&name) {
                Some(provider) => settings.active_provider = provider.clone(),
                None => debug!(provider = %name, "Ignoring unknown saved provider"),
            }
        }

        debug!(
            provider = %settings.active_provider.name,
            configured = settings.credential.is_some(),
            "Loaded saved configuration"
        );
    }

    /// Whether a non-empty credential is set
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.read()
            .credential
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }

    /// The active provider
    #[must_use]
    pub fn current_provider(&self) -> Provider {
        self.read().active_provider.clone()
    }

    /// Switch the active provider in memory only
    ///
    /// Returns `false` and keeps the current provider when the name is unknown.
    pub fn select_provider(&self, name: &str) -> bool {
        match self.registry.find_by_name(name) {
            Some(provider) => {
                self.write().active_provider = provider.clone();
                true
            },
            None => false,
        }
    }

    /// Forget the credential in memory and in storage
    ///
    /// # Errors
    /// - Removing the stored value failed
    pub async fn clear_credential(&self) -> Result<()> {
        self.write().credential = None;
        self.storage.remove(API_KEY_STORAGE_KEY).await
    }

    /// All known providers
    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        self.registry.list_providers()
    }

    /// The provider catalog
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Where settings are persisted
    #[must_use]
    pub fn storage_location(&self) -> String {
        self.storage.location()
    }

    /// Provider and credential for one removal, `None` when unconfigured
    #[must_use]
    pub fn snapshot(&self) -> Option<ActiveConfig> {
        let settings = self.read();
        settings
            .credential
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|credential| ActiveConfig {
                provider: settings.active_provider.clone(),
                credential: credential.clone(),
            })
    }
}
