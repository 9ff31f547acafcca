//! Login, signup, logout and current-user lookup.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ApiError, HttpClient, RequestDescriptor, Response};
use crate::models::UserProfile;

use super::store::Credential;

/// Paths of the authentication endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct AuthEndpoints {
    pub login: String,
    pub signup: String,
    pub current_user: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/token".to_string(),
            signup: "/signin".to_string(),
            current_user: "/users/me".to_string(),
        }
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Drives the token lifecycle on top of an `HttpClient`.
#[derive(Clone)]
pub struct AuthClient {
    http: HttpClient,
    endpoints: AuthEndpoints,
}

impl AuthClient {
    pub fn new(http: HttpClient) -> Self {
        Self::with_endpoints(http, AuthEndpoints::default())
    }

    pub fn with_endpoints(http: HttpClient, endpoints: AuthEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// Any non-success status is reported as `ApiError::Authentication`;
    /// the stored credential is only replaced once a token is in hand.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<Credential, ApiError> {
        let descriptor = RequestDescriptor::post(self.endpoints.login.as_str()).json(&CredentialsBody {
            email: identifier,
            password: secret,
        })?;

        let response = match self.http.dispatch(descriptor, None).await {
            Ok(response) => response,
            Err(ApiError::HttpStatus { status, body }) => {
                debug!(%status, "Login rejected");
                return Err(ApiError::authentication(status, &body));
            }
            Err(e) => return Err(e),
        };

        let credential: Credential = response.json()?;
        if !credential.has_token() {
            return Err(ApiError::InvalidResponse(
                "login response has an empty access_token".to_string(),
            ));
        }
        let record = credential.clone();
        self.http.with_store(move |store| store.save(&record)).await;
        info!("Logged in");
        Ok(credential)
    }

    /// Register a new account. The token store is not touched.
    pub async fn signup(&self, identifier: &str, secret: &str) -> Result<Response, ApiError> {
        let descriptor = RequestDescriptor::post(self.endpoints.signup.as_str()).json(&CredentialsBody {
            email: identifier,
            password: secret,
        })?;
        self.http.dispatch(descriptor, None).await
    }

    /// Forget the stored credential. Local only.
    pub async fn logout(&self) {
        self.http.with_store(|store| store.clear()).await;
        info!("Logged out");
    }

    pub async fn is_authenticated(&self) -> bool {
        self.http
            .with_store(|store| store.is_authenticated())
            .await
            .unwrap_or(false)
    }

    /// Fetch the profile behind the stored token.
    ///
    /// Fails with `NotAuthenticated` before any network traffic when no
    /// token is stored. A 401 also clears the stored token.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let credential = self
            .http
            .load_credential()
            .await
            .ok_or(ApiError::NotAuthenticated)?;

        let descriptor = RequestDescriptor::get(self.endpoints.current_user.as_str());
        match self.http.dispatch(descriptor, Some(&credential)).await {
            Ok(response) => response.json(),
            Err(ApiError::HttpStatus { status, body })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                if status == StatusCode::UNAUTHORIZED {
                    warn!("Stored token rejected, logging out");
                    // Leave a newer login alone
                    self.http
                        .with_store(move |store| {
                            if store.load().as_ref() == Some(&credential) {
                                store.clear();
                            }
                        })
                        .await;
                }
                Err(ApiError::authentication(status, &body))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = AuthEndpoints::default();
        assert_eq!(endpoints.login, "/token");
        assert_eq!(endpoints.signup, "/signin");
        assert_eq!(endpoints.current_user, "/users/me");
    }

    #[test]
    fn test_credentials_body_wire_format() {
        let body = CredentialsBody {
            email: "a@b.com",
            password: "pw",
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            serde_json::json!({"email": "a@b.com", "password": "pw"})
        );
    }
}
