//! The probe pipeline
//!
//! Login, room discovery, target selection, message fetch, sender analysis.
//! Each step records the outcome of its request in the diagnostic log
//! before the next step starts. A failed step logs why and ends the run
//! with a [`Halt`]; nothing is retried except the single room-listing
//! fallback.

use crate::analysis::{analyze_last_message, pretty, render};
use crate::config::ProbeConfig;
use crate::diagnostic::DiagnosticSink;
use community_api_client::endpoints::auth::LOGIN_PATH;
use community_api_client::endpoints::messages::messages_path;
use community_api_client::endpoints::rooms::{ROOMS_PATH, SUPPORT_ROOMS_PATH};
use community_api_client::{
    extract_access_token, unwrap_collection, ApiError, ApiResult, CommunityClient, Credential,
    JsonReply, Room,
};
use community_telemetry::Timer;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Halt {
    #[error("login request failed")]
    LoginFailed,
    #[error("login response carried no access token")]
    MissingToken,
    #[error("room listing unavailable or not an array")]
    RoomsUnavailable,
    #[error("no rooms available")]
    NoRooms,
    #[error("message listing unavailable or not an array")]
    MessagesUnavailable,
}

/// Result of a full run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Every step ran
    Completed,
    /// The run stopped at a logged failure
    Halted(Halt),
}

/// Scripted exploration of the chat backend
pub struct Probe {
    client: CommunityClient,
    config: ProbeConfig,
}

impl Probe {
    pub fn new(client: CommunityClient, config: ProbeConfig) -> Self {
        Self { client, config }
    }

    /// Run every step, logging to `log`
    pub async fn run<S: DiagnosticSink>(
        &self,
        log: &mut S,
        username: &str,
        password: &str,
    ) -> ProbeOutcome {
        match self.steps(log, username, password).await {
            Ok(()) => ProbeOutcome::Completed,
            Err(halt) => {
                warn!(reason = %halt, "Probe halted");
                ProbeOutcome::Halted(halt)
            }
        }
    }

    async fn steps<S: DiagnosticSink>(
        &self,
        log: &mut S,
        username: &str,
        password: &str,
    ) -> Result<(), Halt> {
        let credential = self.authenticate(log, username, password).await?;

        let rooms = self.list_resources(log, &credential).await?;
        let target = select_target(&rooms, &self.config.target_marker).ok_or_else(|| {
            log.line("No rooms available.");
            Halt::NoRooms
        })?;
        log.line(&format!(
            "Target Room: {} ({})",
            render(target.raw().get("name")),
            render(target.id())
        ));

        if self.config.survey_active {
            self.survey_active_chats(log, &credential).await;
        }

        let messages = self.fetch_messages(log, &credential, target).await?;
        analyze_last_message(log, &messages);
        Ok(())
    }

    /// Exchange username and password for a bearer credential
    pub async fn authenticate<S: DiagnosticSink>(
        &self,
        log: &mut S,
        username: &str,
        password: &str,
    ) -> Result<Credential, Halt> {
        let timer = Timer::start("authenticate");
        log.line("Logging in...");

        let reply = self.client.auth().login(username, password).await;
        let Some(body) = record(log, LOGIN_PATH, reply) else {
            log.line("Login failed.");
            return Err(Halt::LoginFailed);
        };

        let Some(credential) = extract_access_token(&body) else {
            log.line(&format!("No token in response: {body}"));
            return Err(Halt::MissingToken);
        };

        log.line("Login successful.");
        timer.stop();
        Ok(credential)
    }

    /// Fetch the room list, falling back once to the general listing
    pub async fn list_resources<S: DiagnosticSink>(
        &self,
        log: &mut S,
        credential: &Credential,
    ) -> Result<Vec<Value>, Halt> {
        let timer = Timer::start("list_resources");
        log.line("Fetching rooms...");

        let rooms_api = self.client.rooms();
        let primary = record(log, SUPPORT_ROOMS_PATH, rooms_api.support_rooms(credential).await);

        let body = match primary {
            Some(body @ Value::Array(_)) => Some(body),
            _ => {
                log.line(&format!("Retry with {ROOMS_PATH}"));
                record(log, ROOMS_PATH, rooms_api.rooms(credential).await)
            }
        };

        let rooms = match body {
            Some(Value::Array(rooms)) => rooms,
            other => {
                let shown = other.unwrap_or(Value::Null);
                log.line(&format!("Could not fetch rooms or not an array: {shown}"));
                return Err(Halt::RoomsUnavailable);
            }
        };

        log.line(&format!("Found {} rooms.", rooms.len()));
        for raw in &rooms {
            let room = Room::new(raw);
            log.line(&format!(
                "- Room {}: {}",
                render(room.id()),
                render(raw.get("name"))
            ));
        }

        timer.stop();
        Ok(rooms)
    }

    /// Fetch the messages of the selected room
    pub async fn fetch_messages<S: DiagnosticSink>(
        &self,
        log: &mut S,
        credential: &Credential,
        room: Room<'_>,
    ) -> Result<Vec<Value>, Halt> {
        let timer = Timer::start("fetch_messages");
        log.line("Fetching messages...");

        let room_id = room.path_id();
        let path = messages_path(&room_id);
        let reply = self.client.messages().list(credential, &room_id).await;

        let Some(Value::Array(messages)) = record(log, &path, reply) else {
            log.line("Could not fetch messages.");
            return Err(Halt::MessagesUnavailable);
        };

        log.line(&format!("Found {} messages.", messages.len()));
        timer.stop();
        Ok(messages)
    }

    /// Inspect the active chat queue; failures here never halt the run
    pub async fn survey_active_chats<S: DiagnosticSink>(&self, log: &mut S, credential: &Credential) {
        log.line(&format!("Fetching active chats ({ROOMS_PATH})..."));

        let Some(body) = record(log, ROOMS_PATH, self.client.rooms().rooms(credential).await) else {
            log.line("Failed to fetch active chats.");
            return;
        };

        let active = unwrap_collection(&body).map(Vec::as_slice).unwrap_or_default();
        log.line(&format!("Found {} active chats.", active.len()));
        if let Some(first) = active.first() {
            log.line("\n--- SAMPLE ACTIVE CHAT ROOM STRUCTURE ---");
            log.line(&pretty(first));
        }
    }
}

/// Pick the room to inspect
///
/// The first room whose name contains `marker` wins; otherwise the first
/// room. `None` only for an empty list.
pub fn select_target<'a>(rooms: &'a [Value], marker: &str) -> Option<Room<'a>> {
    rooms
        .iter()
        .map(Room::new)
        .find(|room| room.name_contains(marker))
        .or_else(|| rooms.first().map(Room::new))
}

/// Log the outcome of one request and reduce it to its body
///
/// Exactly one log event per request. Any failure becomes `None`.
fn record<S: DiagnosticSink>(log: &mut S, path: &str, reply: ApiResult<JsonReply>) -> Option<Value> {
    match reply {
        Ok(reply) => {
            log.line(&format!("Response {path}: {}", reply.status));
            Some(reply.body)
        }
        Err(ApiError::ApiResponse { status, message }) => {
            debug!(path, status, "Non-success response");
            log.line(&format!("Response {path}: {status}\nError body: {message}"));
            None
        }
        Err(e) => {
            warn!(path, error = %e, "Request failed");
            log.line(&format!("Request Error: {e}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::MemoryLog;
    use community_api_client::ClientConfig;
    use mockito::{Mock, ServerGuard};
    use serde_json::json;

    fn probe_for(server: &ServerGuard) -> Probe {
        let client =
            CommunityClient::with_config(ClientConfig::default().with_base_url(server.url()))
                .unwrap();
        Probe::new(client, ProbeConfig::default())
    }

    async fn json_mock(server: &mut ServerGuard, method: &str, path: &str, body: Value) -> Mock {
        server
            .mock(method, path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[test]
    fn test_select_target_prefers_marker_anywhere() {
        let rooms = vec![
            json!({"id": 1, "name": "General"}),
            json!({"id": 2, "name": "Lobby"}),
            json!({"id": 3, "name": "EU Player Support 2"}),
            json!({"id": 4, "name": "Player Support 2 US"}),
        ];
        let target = select_target(&rooms, "Player Support 2").unwrap();
        assert_eq!(target.id(), Some(&json!(3)));
    }

    #[test]
    fn test_select_target_falls_back_to_first() {
        let rooms = vec![json!({"id": 7, "name": "General"}), json!({"id": 8})];
        let target = select_target(&rooms, "Player Support 2").unwrap();
        assert_eq!(target.id(), Some(&json!(7)));

        assert!(select_target(&[], "Player Support 2").is_none());
    }

    #[test]
    fn test_select_target_custom_marker() {
        let rooms = vec![json!({"id": 1, "name": "Player Support 2"}), json!({"id": 2, "name": "VIP"})];
        let target = select_target(&rooms, "VIP").unwrap();
        assert_eq!(target.name(), Some("VIP"));
    }

    #[tokio::test]
    async fn test_object_sender_scenario() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/api/auth/login/")
            .match_body(mockito::Matcher::Json(json!({"username": "alice", "password": "pw1"})))
            .with_status(200)
            .with_body(r#"{"access":"tok1"}"#)
            .create_async()
            .await;
        let rooms = server
            .mock("GET", "/api/support-rooms/")
            .match_header("authorization", "Bearer tok1")
            .with_status(200)
            .with_body(r#"[{"id":5,"name":"Player Support 2 EU"}]"#)
            .create_async()
            .await;
        let messages = json_mock(
            &mut server,
            "GET",
            "/api/rooms/5/messages/",
            json!([{"sender": {"id": 9, "name": "Bob"}}]),
        )
        .await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        login.assert_async().await;
        rooms.assert_async().await;
        messages.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Completed);

        let lines = log.lines();
        assert_eq!(lines[lines.len() - 2], "Sender is OBJECT.");
        assert_eq!(log.last(), Some(r#"{"id":9,"name":"Bob"}"#));
        assert!(log.contains("Target Room: Player Support 2 EU (5)"));
        assert!(log.contains("- Room 5: Player Support 2 EU"));
    }

    #[tokio::test]
    async fn test_primitive_sender_scenario() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"access": "tok1"})).await;
        let _support = json_mock(
            &mut server,
            "GET",
            "/api/support-rooms/",
            json!([{"id": 5, "name": "Player Support 2 EU"}]),
        )
        .await;
        let _messages = json_mock(&mut server, "GET", "/api/rooms/5/messages/", json!([{"sender": 42}])).await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        assert_eq!(outcome, ProbeOutcome::Completed);
        assert_eq!(log.last(), Some("Sender is PRIMITIVE: number = 42"));
    }

    #[tokio::test]
    async fn test_missing_token_stops_before_rooms() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({})).await;
        let support = server
            .mock("GET", "/api/support-rooms/")
            .expect(0)
            .create_async()
            .await;
        let general = server.mock("GET", "/api/rooms/").expect(0).create_async().await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        support.assert_async().await;
        general.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Halted(Halt::MissingToken));
        assert_eq!(log.last(), Some("No token in response: {}"));
    }

    #[tokio::test]
    async fn test_nested_token_is_used() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"data": {"access": "T"}})).await;
        let support = server
            .mock("GET", "/api/support-rooms/")
            .match_header("authorization", "Bearer T")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        support.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Halted(Halt::NoRooms));
        assert_eq!(log.last(), Some("No rooms available."));
    }

    #[tokio::test]
    async fn test_login_rejected_logs_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/api/auth/login/")
            .with_status(401)
            .with_body(r#"{"detail":"No active account"}"#)
            .create_async()
            .await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "bad").await;

        assert_eq!(outcome, ProbeOutcome::Halted(Halt::LoginFailed));
        assert_eq!(
            log.lines(),
            [
                "Logging in...",
                "Response /api/auth/login/: 401\nError body: {\"detail\":\"No active account\"}",
                "Login failed.",
            ]
        );
    }

    #[tokio::test]
    async fn test_non_array_primary_triggers_one_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"access": "tok1"})).await;
        let support = server
            .mock("GET", "/api/support-rooms/")
            .with_status(200)
            .with_body(r#"{"detail":"moved"}"#)
            .expect(1)
            .create_async()
            .await;
        let general = server
            .mock("GET", "/api/rooms/")
            .with_status(200)
            .with_body(r#"[{"id":"r1","name":"General"}]"#)
            .expect(1)
            .create_async()
            .await;
        let _messages = json_mock(&mut server, "GET", "/api/rooms/r1/messages/", json!([])).await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        support.assert_async().await;
        general.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Completed);
        assert!(log.contains("Retry with /api/rooms/"));
        assert!(log.contains("Target Room: General (r1)"));
        assert_eq!(log.last(), Some("No messages in this room to analyze."));
    }

    #[tokio::test]
    async fn test_both_listings_fail_halts() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"access": "tok1"})).await;
        let _support = server
            .mock("GET", "/api/support-rooms/")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;
        let general = server
            .mock("GET", "/api/rooms/")
            .with_status(200)
            .with_body(r#"{"count":0}"#)
            .expect(1)
            .create_async()
            .await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        general.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Halted(Halt::RoomsUnavailable));
        assert!(log.contains("Response /api/support-rooms/: 500\nError body: oops"));
        assert_eq!(
            log.last(),
            Some(r#"Could not fetch rooms or not an array: {"count":0}"#)
        );
    }

    #[tokio::test]
    async fn test_messages_not_array_halts() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"access": "tok1"})).await;
        let _support = json_mock(&mut server, "GET", "/api/support-rooms/", json!([{"id": 3, "name": "Lobby"}]))
            .await;
        let _messages = json_mock(&mut server, "GET", "/api/rooms/3/messages/", json!({"results": []})).await;

        let mut log = MemoryLog::new();
        let outcome = probe_for(&server).run(&mut log, "alice", "pw1").await;

        assert_eq!(outcome, ProbeOutcome::Halted(Halt::MessagesUnavailable));
        assert_eq!(log.last(), Some("Could not fetch messages."));
    }

    #[tokio::test]
    async fn test_transport_failure_is_logged_not_raised() {
        let client =
            CommunityClient::with_config(ClientConfig::default().with_base_url("http://127.0.0.1:9"))
                .unwrap();
        let probe = Probe::new(client, ProbeConfig::default());

        let mut log = MemoryLog::new();
        let outcome = probe.run(&mut log, "alice", "pw1").await;

        assert_eq!(outcome, ProbeOutcome::Halted(Halt::LoginFailed));
        assert!(log.lines()[1].starts_with("Request Error: "));
        assert_eq!(log.last(), Some("Login failed."));
    }

    #[tokio::test]
    async fn test_survey_accepts_pagination_wrapper() {
        let mut server = mockito::Server::new_async().await;
        let _active = json_mock(
            &mut server,
            "GET",
            "/api/rooms/",
            json!({"data": [{"id": 11, "status": "queued"}], "total": 1}),
        )
        .await;

        let mut log = MemoryLog::new();
        probe_for(&server)
            .survey_active_chats(&mut log, &Credential::new("tok1"))
            .await;

        assert!(log.contains("Found 1 active chats."));
        assert_eq!(log.last(), Some("{\n  \"id\": 11,\n  \"status\": \"queued\"\n}"));
    }

    #[tokio::test]
    async fn test_survey_failure_does_not_halt() {
        let mut server = mockito::Server::new_async().await;
        let _login = json_mock(&mut server, "POST", "/api/auth/login/", json!({"access": "tok1"})).await;
        let _support = json_mock(&mut server, "GET", "/api/support-rooms/", json!([{"id": 2, "name": "Lobby"}]))
            .await;
        let _rooms = server
            .mock("GET", "/api/rooms/")
            .with_status(403)
            .create_async()
            .await;
        let _messages = json_mock(&mut server, "GET", "/api/rooms/2/messages/", json!([{"sender": "u1"}])).await;

        let client =
            CommunityClient::with_config(ClientConfig::default().with_base_url(server.url()))
                .unwrap();
        let config = ProbeConfig::default().with_survey_active(true);
        let mut log = MemoryLog::new();
        let outcome = Probe::new(client, config).run(&mut log, "alice", "pw1").await;

        assert_eq!(outcome, ProbeOutcome::Completed);
        assert!(log.contains("Failed to fetch active chats."));
        assert_eq!(log.last(), Some("Sender is PRIMITIVE: string = u1"));
    }
}
