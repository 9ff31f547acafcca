//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! API base URL, which token store backend to use, optional log directory,
//! and the last email used to log in.
//!
//! Configuration is stored at `~/.config/modelhub/config.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ClientConfig, DEFAULT_BASE_URL};
use crate::auth::{
    AuthEndpoints, EncryptedFileTokenStore, FileTokenStore, KeyringTokenStore, MemoryTokenStore,
    TokenStore,
};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "modelhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "MODELHUB_BASE_URL";

/// Environment variable holding the encrypted store passphrase
pub const PASSPHRASE_ENV: &str = "MODELHUB_PASSPHRASE";

/// Token store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    File,
    Keyring,
    Encrypted,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            "keyring" | "keychain" => Ok(StoreKind::Keyring),
            "encrypted" => Ok(StoreKind::Encrypted),
            other => Err(anyhow::anyhow!("Unknown token store {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub store: StoreKind,
    /// Request timeout in seconds; unset means no client-side timeout.
    pub timeout_secs: Option<u64>,
    pub endpoints: AuthEndpoints,
    pub log_dir: Option<PathBuf>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            store: StoreKind::default(),
            timeout_secs: None,
            endpoints: AuthEndpoints::default(),
            log_dir: None,
            last_email: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Environment overrides take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding file-backed token stores.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::config_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.base_url)?;
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Build the configured token store backend.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.store {
            StoreKind::Memory => Arc::new(MemoryTokenStore::new()),
            StoreKind::File => Arc::new(FileTokenStore::new(self.data_dir()?)),
            StoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
            StoreKind::Encrypted => {
                let passphrase = std::env::var(PASSPHRASE_ENV).with_context(|| {
                    format!("{} must be set to use the encrypted token store", PASSPHRASE_ENV)
                })?;
                Arc::new(EncryptedFileTokenStore::new(self.data_dir()?, passphrase))
            }
        };
        Ok(store)
    }
}
