//! REST API client module for the model management service.
//!
//! `HttpClient` sends requests against a configured base URL and attaches
//! the stored bearer token; `ApiClient` layers typed dataset, model,
//! training and admin calls on top of it.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ClientConfig, HttpClient, RequestDescriptor, Response, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use resources::ApiClient;
