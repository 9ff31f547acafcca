//! Passphrase-protected token file.
//!
//! The record is sealed with ChaCha20-Poly1305. The key is derived from the
//! passphrase with Argon2id over a random salt; salt and nonce are stored
//! next to the ciphertext. Each handle derives a key once and keeps it for
//! as long as the file's salt matches, so repeated loads and saves only pay
//! for Argon2 when another handle has rewritten the file. Every save still
//! draws a fresh nonce. Anything that fails to open (wrong passphrase,
//! tampering, truncation) loads as absent.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{decode, encode, Credential, TokenStore};

const SEALED_FILE: &str = "token.sealed";
const SEALED_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct SealedRecord {
    version: u8,
    salt: Vec<u8>,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

/// A derived key and the salt it was derived with.
#[derive(Clone)]
struct DerivedKey {
    salt: Vec<u8>,
    cipher: ChaCha20Poly1305,
}

pub struct EncryptedFileTokenStore {
    path: PathBuf,
    passphrase: String,
    key: Mutex<Option<DerivedKey>>,
}

impl std::fmt::Debug for EncryptedFileTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileTokenStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EncryptedFileTokenStore {
    pub fn new(dir: impl AsRef<Path>, passphrase: impl Into<String>) -> Self {
        Self {
            path: dir.as_ref().join(SEALED_FILE),
            passphrase: passphrase.into(),
            key: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cached(&self) -> MutexGuard<'_, Option<DerivedKey>> {
        self.key.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn derive(&self, salt: &[u8]) -> Option<DerivedKey> {
        let mut key = [0u8; KEY_LEN];
        if let Err(e) = Argon2::default().hash_password_into(self.passphrase.as_bytes(), salt, &mut key) {
            warn!(error = %e, "Key derivation failed");
            return None;
        }
        debug!("Derived token encryption key");
        Some(DerivedKey {
            salt: salt.to_vec(),
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    /// Key for `salt`, derived at most once per salt.
    fn key_for(&self, salt: &[u8]) -> Option<DerivedKey> {
        let mut cached = self.cached();
        if let Some(key) = cached.as_ref().filter(|key| key.salt == salt) {
            return Some(key.clone());
        }
        let key = self.derive(salt)?;
        *cached = Some(key.clone());
        Some(key)
    }

    /// Key for a new save: the cached one, or one over a fresh salt.
    fn sealing_key(&self) -> Option<DerivedKey> {
        if let Some(key) = self.cached().clone() {
            return Some(key);
        }
        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        self.key_for(&salt)
    }

    fn seal(&self, plaintext: &str) -> Option<SealedRecord> {
        let key = self.sealing_key()?;
        let mut nonce = vec![0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        match key.cipher.encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes()) {
            Ok(ciphertext) => Some(SealedRecord {
                version: SEALED_VERSION,
                salt: key.salt,
                nonce,
                ciphertext,
            }),
            Err(e) => {
                warn!(error = %e, "Failed to encrypt credential");
                None
            }
        }
    }

    fn open(&self, sealed: &SealedRecord) -> Option<String> {
        if sealed.version != SEALED_VERSION || sealed.nonce.len() != NONCE_LEN || sealed.salt.len() != SALT_LEN {
            debug!(version = sealed.version, "Unsupported sealed token layout");
            return None;
        }
        let key = self.key_for(&sealed.salt)?;
        let plaintext = key
            .cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| debug!("Sealed token did not authenticate"))
            .ok()?;
        String::from_utf8(plaintext).ok()
    }

    fn write(&self, sealed: &SealedRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(sealed)?)?;
        Ok(())
    }
}

impl TokenStore for EncryptedFileTokenStore {
    fn save(&self, record: &Credential) {
        let Some(sealed) = encode(record).and_then(|raw| self.seal(&raw)) else {
            return;
        };
        if let Err(e) = self.write(&sealed) {
            warn!(path = %self.path.display(), error = %e, "Failed to write sealed token");
        }
    }

    fn load(&self) -> Option<Credential> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read sealed token");
                return None;
            }
        };
        let sealed: SealedRecord = serde_json::from_slice(&bytes)
            .map_err(|e| debug!(error = %e, "Sealed token file is malformed"))
            .ok()?;
        self.open(&sealed).as_deref().and_then(decode)
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove sealed token"),
        }
    }
}
