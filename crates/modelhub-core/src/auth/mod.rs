//! Authentication and credential persistence.
//!
//! This module provides:
//! - `TokenStore`: the single-record credential persistence trait, with
//!   in-memory, plain file, OS keychain and passphrase-encrypted backends
//! - `AuthClient`: login/signup/logout and current-user lookup
//!
//! A stored `Credential` is the only signal of being logged in; there is no
//! expiry tracking and no refresh.

pub mod client;
pub mod encrypted;
pub mod keychain;
pub mod store;

pub use client::{AuthClient, AuthEndpoints};
pub use encrypted::EncryptedFileTokenStore;
pub use keychain::KeyringTokenStore;
pub use store::{Credential, FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
