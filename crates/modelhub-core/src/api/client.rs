//! HTTP client for the model management REST API.
//!
//! Every request goes through `HttpClient::request`, which reads the token
//! store right before dispatch and attaches `Authorization: Bearer <token>`
//! when a credential is present. Nothing is retried: transport failures and
//! error statuses are handed back to the caller as `ApiError`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{Credential, TokenStore};

use super::ApiError;

/// Default API address used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for an `HttpClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL {base_url:?}: {e}")))?;
        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `base_url + path`, joined with exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Build a request path from raw segments, percent-encoding each one.
    /// The result is relative to `base_url`, like any descriptor path.
    pub fn path_from_segments(&self, segments: &[&str]) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("base URL {} cannot take a path", self.base_url)))?
            .clear()
            .extend(segments);
        Ok(url.path().to_string())
    }
}

/// One outgoing call, before header injection.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set `Authorization: Bearer <token>` for the given credential.
    pub fn authorize(&mut self, credential: &Credential) {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()));
        self.headers
            .insert(header::AUTHORIZATION.to_string(), credential.bearer());
    }

    fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("header value for {name}: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// A successful response: status plus the raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

impl Response {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("{e} in body: {}", ApiError::truncate_body(&self.body)))
        })
    }
}

/// Authenticated API client.
/// Clone is cheap - reqwest::Client and the token store are both shared.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
}

impl HttpClient {
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
            store,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Run a closure against the token store off the async threads;
    /// keychain and encrypted backends do blocking work.
    pub(crate) async fn with_store<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&dyn TokenStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || f(store.as_ref())).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Token store task failed");
                None
            }
        }
    }

    pub(crate) async fn load_credential(&self) -> Option<Credential> {
        self.with_store(|store| store.load()).await.flatten()
    }

    /// Send a request, attaching the stored bearer token if there is one.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Response, ApiError> {
        let credential = self.load_credential().await;
        self.dispatch(descriptor, credential.as_ref()).await
    }

    /// Send a request with exactly the given credential (or none),
    /// bypassing the token store.
    pub(crate) async fn dispatch(
        &self,
        mut descriptor: RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Result<Response, ApiError> {
        let credential = credential.filter(|c| c.has_token());
        if let Some(credential) = credential {
            descriptor.authorize(credential);
        }
        let url = self.config.url_for(&descriptor.path);
        debug!(method = %descriptor.method, url = %url, authenticated = credential.is_some(), "Sending request");

        let mut builder = self
            .client
            .request(descriptor.method.clone(), &url)
            .headers(descriptor.header_map()?);
        if let Some(ref body) = descriptor.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(Response { status, body })
        } else {
            debug!(%status, url = %url, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestDescriptor::get(path)).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestDescriptor::post(path).json(body)?)
            .await?
            .json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestDescriptor::delete(path)).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_with_single_slash() {
        let config = ClientConfig::new("http://localhost:8000").expect("config");
        assert_eq!(config.url_for("/token"), "http://localhost:8000/token");
        assert_eq!(config.url_for("users/me"), "http://localhost:8000/users/me");

        let config = ClientConfig::new("http://api.example.com/v1/").expect("config");
        assert_eq!(config.url_for("/datasets/3"), "http://api.example.com/v1/datasets/3");
        assert_eq!(config.url_for(""), "http://api.example.com/v1/");
    }

    #[test]
    fn test_path_from_segments_encodes_each_segment() {
        let config = ClientConfig::new("http://api.example.com/v1/").expect("config");
        let path = config
            .path_from_segments(&["admin", "users", "delete", "a@b.com"])
            .expect("path");
        assert_eq!(path, "/admin/users/delete/a@b.com");

        let path = config.path_from_segments(&["admin", "users", "delete", "a/b c?"]).expect("path");
        assert_eq!(path, "/admin/users/delete/a%2Fb%20c%3F");
        assert_eq!(config.url_for(&path), "http://api.example.com/v1/admin/users/delete/a%2Fb%20c%3F");
    }

    #[test]
    fn test_client_config_rejects_bad_url() {
        assert!(matches!(ClientConfig::new("not a url"), Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn test_client_config_default_url() {
        let config = ClientConfig::new(DEFAULT_BASE_URL).expect("config");
        assert_eq!(config.url_for("/x"), "http://localhost:8000/x");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_authorize_sets_bearer_header() {
        let mut descriptor = RequestDescriptor::get("/users/me").header("authorization", "Basic old");
        descriptor.authorize(&Credential::new("abc"));
        assert_eq!(descriptor.headers.len(), 1);
        assert_eq!(descriptor.headers.get("authorization").map(String::as_str), Some("Bearer abc"));
    }

    #[test]
    fn test_header_map_rejects_invalid_values() {
        let descriptor = RequestDescriptor::get("/").header("x-ok", "line\nbreak");
        assert!(matches!(descriptor.header_map(), Err(ApiError::InvalidRequest(_))));

        let descriptor = RequestDescriptor::get("/").header("bad name", "v");
        assert!(matches!(descriptor.header_map(), Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = Response {
            status: StatusCode::OK,
            body: "not json".to_string(),
        };
        let result: Result<Value, _> = response.json();
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }
}
