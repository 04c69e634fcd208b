//! Join link generation and parsing
//!
//! Link format: salon://<host>:<port>/<exhibit-id>/<token>
//!
//! The token is the invitation token; the server resolves it back to
//! the invitee when the draft is fetched.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Parsed join link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    pub host: IpAddr,
    pub port: u16,
    pub exhibit_id: Uuid,
    pub token: String,
}

impl JoinLink {
    /// Create a new join link
    pub fn new(host: IpAddr, port: u16, exhibit_id: Uuid, token: String) -> Self {
        Self {
            host,
            port,
            exhibit_id,
            token,
        }
    }

    /// Create from a socket address
    pub fn from_addr(addr: SocketAddr, exhibit_id: Uuid, token: String) -> Self {
        Self {
            host: addr.ip(),
            port: addr.port(),
            exhibit_id,
            token,
        }
    }

    /// Get the socket address for connection
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Format as URL string. IPv6 hosts come out bracketed, so every
    /// generated link parses back.
    pub fn to_url(&self) -> String {
        format!(
            "salon://{}/{}/{}",
            self.socket_addr(),
            self.exhibit_id,
            self.token
        )
    }

    /// Parse from URL string
    pub fn parse(s: &str) -> Result<Self> {
        // Strip protocol prefix
        let s = s
            .strip_prefix("salon://")
            .ok_or_else(|| Error::Protocol("Invalid join link: missing salon:// prefix".into()))?;

        // Split into parts: host:port/exhibit_id/token
        let parts: Vec<&str> = s.splitn(3, '/').collect();
        if parts.len() != 3 {
            return Err(Error::Protocol(
                "Invalid join link: expected host:port/exhibit_id/token".into(),
            ));
        }

        // Parse host:port
        let host_port = parts[0];
        let addr: SocketAddr = host_port.parse().map_err(|_| {
            Error::Protocol(format!("Invalid join link: bad address '{}'", host_port))
        })?;

        // Parse exhibit_id
        let exhibit_id = Uuid::from_str(parts[1]).map_err(|_| {
            Error::Protocol(format!("Invalid join link: bad exhibit id '{}'", parts[1]))
        })?;

        // Token is the rest
        let token = parts[2].to_string();
        if token.is_empty() {
            return Err(Error::Protocol("Invalid join link: empty token".into()));
        }

        Ok(Self {
            host: addr.ip(),
            port: addr.port(),
            exhibit_id,
            token,
        })
    }
}

impl std::fmt::Display for JoinLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for JoinLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
