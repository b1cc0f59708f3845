//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for a specific set of backend endpoints.
//!
//! | Module | Backend path | Description |
//! |--------|--------------|-------------|
//! | `auth` | `/api/auth/login/` | Username/password to bearer token |
//! | `rooms` | `/api/support-rooms/`, `/api/rooms/` | Room listings |
//! | `messages` | `/api/rooms/{id}/messages/` | Messages of one room |

pub mod auth;
pub mod messages;
pub mod rooms;

pub use auth::{extract_access_token, AuthApi, Credential};
pub use messages::MessagesApi;
pub use rooms::{unwrap_collection, Room, RoomsApi};
