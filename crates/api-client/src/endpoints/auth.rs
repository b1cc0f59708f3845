//! Authentication endpoints
//!
//! Maps to `POST /api/auth/login/`, which exchanges a username and password
//! for a bearer token.

use crate::client::{CommunityClient, JsonReply};
use crate::error::ApiResult;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Login path
pub const LOGIN_PATH: &str = "/api/auth/login/";

/// Bearer credential returned by a successful login
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Login request body
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account name
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: CommunityClient,
}

impl AuthApi {
    /// Create a new auth API interface
    pub(crate) fn new(client: CommunityClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token
    ///
    /// POST /api/auth/login/
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<JsonReply> {
        let body = LoginRequest { username, password };
        self.client.post(LOGIN_PATH, &body, None).await
    }
}

/// Find the access token in a login response
///
/// The backend has been seen returning it both at the top level
/// (`{"access": ..}`) and wrapped (`{"data": {"access": ..}}`). Only
/// non-empty strings count.
#[must_use]
pub fn extract_access_token(body: &Value) -> Option<Credential> {
    let top = body.get("access");
    let nested = body.get("data").and_then(|data| data.get("access"));

    [top, nested]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|token| !token.is_empty())
        .map(Credential::new)
}
