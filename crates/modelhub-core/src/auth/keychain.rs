use keyring::Entry;
use tracing::warn;

use super::store::{decode, encode, Credential, TokenStore, TOKEN_KEY};

/// Default keychain service name.
pub const SERVICE_NAME: &str = "modelhub";

/// Keeps the credential record in the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a different keychain service, e.g. one per API deployment.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self) -> Option<Entry> {
        match Entry::new(&self.service, TOKEN_KEY) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(service = %self.service, error = %e, "Failed to create keyring entry");
                None
            }
        }
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, record: &Credential) {
        let (Some(entry), Some(raw)) = (self.entry(), encode(record)) else {
            return;
        };
        if let Err(e) = entry.set_password(&raw) {
            warn!(error = %e, "Failed to store token in keychain");
        }
    }

    fn load(&self) -> Option<Credential> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => decode(&raw),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn clear(&self) {
        let Some(entry) = self.entry() else { return };
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => warn!(error = %e, "Failed to delete token from keychain"),
        }
    }
}
