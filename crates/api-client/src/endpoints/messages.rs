//! Room message endpoints

use crate::client::{CommunityClient, JsonReply};
use crate::endpoints::auth::Credential;
use crate::error::ApiResult;

/// Message API interface
#[derive(Clone)]
pub struct MessagesApi {
    client: CommunityClient,
}

impl MessagesApi {
    /// Create a new messages API interface
    pub(crate) fn new(client: CommunityClient) -> Self {
        Self { client }
    }

    /// GET /api/rooms/{id}/messages/
    pub async fn list(&self, credential: &Credential, room_id: &str) -> ApiResult<JsonReply> {
        self.client
            .get(&messages_path(room_id), Some(credential))
            .await
    }
}

/// Path of the message list for a room
#[must_use]
pub fn messages_path(room_id: &str) -> String {
    format!("/api/rooms/{room_id}/messages/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_path() {
        assert_eq!(messages_path("5"), "/api/rooms/5/messages/");
        assert_eq!(messages_path("a-b"), "/api/rooms/a-b/messages/");
    }
}
