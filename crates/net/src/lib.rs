//! Salon Network Library
//!
//! Provides the TCP API between Salon clients and the exhibit server.
//!
//! # Architecture
//!
//! - **Server**: owns the database, validates every bearer token
//! - **Client**: typed API calls with coalesced token refresh
//! - **Protocol**: length-prefixed JSON request/response frames
//!
//! # Usage
//!
//! ```ignore
//! // Service side
//! let server = Server::start(7341, db).await?;
//!
//! // Client side
//! let client = ApiClient::new(server.addr());
//! client.login("ada", "secret").await?;
//! let exhibits = client.list_exhibits().await?;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod join_link;
pub mod protocol;
pub mod server;

pub use client::{ApiClient, AuthTokens};
pub use error::{Error, Result};
pub use join_link::JoinLink;
pub use protocol::{DraftPayload, DraftView, ErrorCode, Request, Response, SlotOp};
pub use server::{Server, SharedDb};

/// Default port for Salon servers
pub const DEFAULT_PORT: u16 = 7341;
