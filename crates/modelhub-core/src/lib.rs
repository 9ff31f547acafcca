//! Client library for the model management API.
//!
//! - `api`: `HttpClient` (bearer-token injection) and the typed `ApiClient`
//! - `auth`: `TokenStore` backends and `AuthClient`
//! - `models`: users, datasets, models, trainings
//! - `routes`: path → view table
//! - `config`: persisted client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiClient, ApiError, ClientConfig, HttpClient, RequestDescriptor, Response};
pub use auth::{AuthClient, AuthEndpoints, Credential, TokenStore};
pub use config::{Config, StoreKind};
