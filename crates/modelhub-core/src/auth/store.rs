//! Credential record and the `TokenStore` persistence abstraction.
//!
//! Every backend stores exactly one serialized `Credential` under
//! `TOKEN_KEY`. Storage failures never reach the caller: `save` logs and
//! gives up, `load` reports anything unreadable as absent.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Well-known key the credential record is stored under.
pub const TOKEN_KEY: &str = "token";

/// Token file name inside a `FileTokenStore` directory
const TOKEN_FILE: &str = "token.json";

/// The login response as persisted. Fields other than `access_token` and
/// `token_type` are carried in `extra` so the full body survives a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            extra: Map::new(),
        }
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// An empty token authenticates nothing.
    pub fn has_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Persistence for the single credential record.
pub trait TokenStore: Send + Sync {
    /// Overwrite the stored record. Failures are logged, not returned.
    fn save(&self, record: &Credential);

    /// The stored record, or `None` if missing or unreadable.
    fn load(&self) -> Option<Credential>;

    /// Remove the stored record. Removing nothing is not an error.
    fn clear(&self);

    /// Whether a credential is currently stored.
    fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }
}

pub(crate) fn encode(record: &Credential) -> Option<String> {
    match serde_json::to_string_pretty(record) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "Failed to serialize credential");
            None
        }
    }
}

pub(crate) fn decode(raw: &str) -> Option<Credential> {
    match serde_json::from_str::<Credential>(raw) {
        Ok(record) if record.has_token() => Some(record),
        Ok(_) => {
            debug!("Stored credential has an empty token, treating as absent");
            None
        }
        Err(e) => {
            debug!(error = %e, "Stored credential is malformed, treating as absent");
            None
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Holds the serialized record in process memory.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    raw: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an arbitrary stored value, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, record: &Credential) {
        if let Some(raw) = encode(record) {
            *self.slot() = Some(raw);
        }
    }

    fn load(&self) -> Option<Credential> {
        self.slot().as_deref().and_then(decode)
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}

// ============================================================================
// Plain file
// ============================================================================

/// Stores the record as `token.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, contents: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, record: &Credential) {
        let Some(raw) = encode(record) else { return };
        if let Err(e) = self.write(&raw) {
            warn!(path = %self.path.display(), error = %e, "Failed to write token file");
        }
    }

    fn load(&self) -> Option<Credential> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                None
            }
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove token file"),
        }
    }
}
