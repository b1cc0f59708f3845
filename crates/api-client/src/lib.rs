//! API client for the community chat backend
//!
//! This crate provides a small, typed HTTP client for the staff/community
//! support chat backend.
//!
//! # Features
//!
//! - **Builder-style configuration**: Production defaults with per-field overrides
//! - **Explicit outcomes**: Every call resolves to a [`JsonReply`] or an [`ApiError`], never a panic
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use community_api_client::{extract_access_token, ClientConfig, CommunityClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CommunityClient::with_config(ClientConfig::default())?;
//!
//!     let login = client.auth().login("alice", "pw1").await?;
//!     let credential = extract_access_token(&login.body).ok_or("no token")?;
//!
//!     let rooms = client.rooms().support_rooms(&credential).await?;
//!     println!("rooms: {}", rooms.body);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::{CommunityClient, JsonReply};
pub use config::ClientConfig;
pub use endpoints::{extract_access_token, unwrap_collection, Credential, Room};
pub use error::{ApiError, ApiResult};

