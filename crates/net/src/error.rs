//! Network error types

use std::io;

use crate::protocol::ErrorCode;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server refused request [{code:?}]: {message}")]
    Api { code: ErrorCode, message: String },

    #[error("Session expired")]
    SessionExpired,

    #[error("Not logged in")]
    NotLoggedIn,
}

impl Error {
    /// True for the one server error a request may retry after a refresh
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Error::Api {
                code: ErrorCode::AuthExpired,
                ..
            }
        )
    }
}
