//! Room listing endpoints
//!
//! The backend exposes the same concept under two names:
//! - `/api/support-rooms/` for staff support rooms
//! - `/api/rooms/` for the general room list (also the active chat queue)

use crate::client::{CommunityClient, JsonReply};
use crate::endpoints::auth::Credential;
use crate::error::ApiResult;
use serde_json::Value;

/// Staff support room listing
pub const SUPPORT_ROOMS_PATH: &str = "/api/support-rooms/";

/// General room listing
pub const ROOMS_PATH: &str = "/api/rooms/";

/// Room API interface
#[derive(Clone)]
pub struct RoomsApi {
    client: CommunityClient,
}

impl RoomsApi {
    /// Create a new rooms API interface
    pub(crate) fn new(client: CommunityClient) -> Self {
        Self { client }
    }

    /// GET /api/support-rooms/
    pub async fn support_rooms(&self, credential: &Credential) -> ApiResult<JsonReply> {
        self.client.get(SUPPORT_ROOMS_PATH, Some(credential)).await
    }

    /// GET /api/rooms/
    pub async fn rooms(&self, credential: &Credential) -> ApiResult<JsonReply> {
        self.client.get(ROOMS_PATH, Some(credential)).await
    }
}

/// Lenient view of a room record
///
/// Room payloads carry many more fields; only the identifier and display
/// name are needed to pick a target.
#[derive(Debug, Clone, Copy)]
pub struct Room<'a> {
    raw: &'a Value,
}

impl<'a> Room<'a> {
    /// Wrap a raw room record
    #[must_use]
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// The raw record
    #[must_use]
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// Identifier, as it appears in the payload
    #[must_use]
    pub fn id(&self) -> Option<&'a Value> {
        self.raw.get("id")
    }

    /// Display name, when it is a string
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    /// Whether the display name contains `marker`
    #[must_use]
    pub fn name_contains(&self, marker: &str) -> bool {
        self.name().is_some_and(|name| name.contains(marker))
    }

    /// Identifier rendered for use in a URL path segment
    ///
    /// Same rendering as a log line: bare strings, `null` for null, and
    /// `undefined` when the field is absent.
    #[must_use]
    pub fn path_id(&self) -> String {
        match self.id() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        }
    }
}

/// Extract the list from a collection body
///
/// Accepts a bare array or a pagination wrapper of the form
/// `{"data": [...]}`.
#[must_use]
pub fn unwrap_collection(body: &Value) -> Option<&Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        _ => None,
    }
}
