//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{AuthApi, Credential, MessagesApi, RoomsApi};
use crate::error::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// A successful (2xx) exchange with the backend
///
/// Bodies that are not valid JSON are kept verbatim as [`Value::String`], so
/// callers can still log them and reject them on shape.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonReply {
    /// HTTP status code
    pub status: u16,
    /// Parsed body
    pub body: Value,
}

/// HTTP client for the community chat backend
///
/// A thin wrapper over `reqwest`: one request per call, no retries. Every
/// call resolves to an [`ApiResult`], never a panic.
#[derive(Clone)]
pub struct CommunityClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl CommunityClient {
    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access authentication endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access room listing endpoints
    #[must_use]
    pub fn rooms(&self) -> RoomsApi {
        RoomsApi::new(self.clone())
    }

    /// Access room message endpoints
    #[must_use]
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Perform a GET request
    pub async fn get(&self, path: &str, credential: Option<&Credential>) -> ApiResult<JsonReply> {
        self.send(Method::GET, path, Option::<&()>::None, credential)
            .await
    }

    /// Perform a POST request with a JSON body
    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> ApiResult<JsonReply> {
        self.send(Method::POST, path, Some(body), credential).await
    }

    /// Execute a single request and classify its outcome
    #[instrument(skip(self, body, credential), fields(request_id))]
    pub async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<&Credential>,
    ) -> ApiResult<JsonReply> {
        let url = self.config.url_for(path);
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .request(method, &url)
            .header(X_REQUEST_ID, &request_id);

        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.bearer());
        }

        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            bytes = text.len(),
            "Response received"
        );

        if !status.is_success() {
            return Err(ApiError::api_response(status.as_u16(), text));
        }

        Ok(JsonReply {
            status: status.as_u16(),
            body: parse_body(text),
        })
    }
}

/// Parse a response body as JSON, keeping non-JSON text verbatim
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
