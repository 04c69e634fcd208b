//! API client with coalesced token refresh
//!
//! Each call opens a short-lived connection, sends one request and
//! reads one response. The interesting part is the auth path: when a
//! request bounces with `AuthExpired`, the client refreshes the token
//! pair and replays the request exactly once. All callers share one
//! async lock around the token state, so concurrent failures produce
//! a single refresh; waiters notice the rotated access token and skip
//! straight to the replay.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use salon_core::models::{Artwork, ExhibitSummary, Invitation, InvitationStatus};
use salon_core::view_mode::InspectionMode;
use salon_core::ExhibitDraft;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{DraftPayload, DraftView, Request, Response};

/// The client's half of a session: the rotating token pair
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

/// Handle for talking to a Salon server
///
/// Cheap to clone; clones share the token state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    addr: SocketAddr,
    auth: Arc<Mutex<Option<AuthTokens>>>,
}

impl ApiClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            auth: Arc::new(Mutex::new(None)),
        }
    }

    /// Adopt a previously saved token pair
    pub async fn restore_tokens(&self, tokens: AuthTokens) {
        *self.auth.lock().await = Some(tokens);
    }

    /// Current token pair, if logged in
    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.auth.lock().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.auth.lock().await.is_some()
    }

    /// Create an account
    pub async fn register(&self, username: &str, password: &str) -> Result<Uuid> {
        match self
            .call(Request::Register {
                username: username.into(),
                password: password.into(),
            })
            .await?
        {
            Response::Registered { user_id } => Ok(user_id),
            other => Err(unexpected(other)),
        }
    }

    /// Log in and start a session
    pub async fn login(&self, username: &str, password: &str) -> Result<Uuid> {
        match self
            .call(Request::Login {
                username: username.into(),
                password: password.into(),
            })
            .await?
        {
            Response::Tokens {
                user_id,
                access_token,
                refresh_token,
                ..
            } => {
                *self.auth.lock().await = Some(AuthTokens {
                    access: access_token,
                    refresh: refresh_token,
                });
                info!(user_id = %user_id, "Logged in");
                Ok(user_id)
            }
            other => Err(unexpected(other)),
        }
    }

    /// End the session on both sides
    pub async fn logout(&self) -> Result<()> {
        let tokens = self.auth.lock().await.take();
        let Some(tokens) = tokens else {
            return Ok(());
        };
        match self
            .call(Request::Logout {
                access_token: tokens.access,
            })
            .await?
        {
            Response::LoggedOut => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_exhibits(&self) -> Result<Vec<ExhibitSummary>> {
        match self
            .authed(|access_token| Request::ListExhibits { access_token })
            .await?
        {
            Response::Exhibits { exhibits } => Ok(exhibits),
            other => Err(unexpected(other)),
        }
    }

    pub async fn fetch_draft(
        &self,
        exhibit_id: Uuid,
        mode: Option<InspectionMode>,
        join_token: Option<String>,
    ) -> Result<DraftView> {
        match self
            .authed(|access_token| Request::FetchDraft {
                access_token,
                exhibit_id,
                mode,
                join_token: join_token.clone(),
            })
            .await?
        {
            Response::Draft(view) => Ok(view),
            other => Err(unexpected(other)),
        }
    }

    pub async fn save_draft(&self, payload: DraftPayload) -> Result<ExhibitDraft> {
        match self
            .authed(|access_token| Request::SaveDraft {
                access_token,
                payload: payload.clone(),
            })
            .await?
        {
            Response::Saved { draft } => Ok(draft),
            other => Err(unexpected(other)),
        }
    }

    pub async fn publish_draft(&self, exhibit_id: Uuid) -> Result<()> {
        match self
            .authed(|access_token| Request::PublishDraft {
                access_token,
                exhibit_id,
            })
            .await?
        {
            Response::Published { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn register_artwork(&self, title: &str) -> Result<Artwork> {
        let title = title.to_string();
        match self
            .authed(|access_token| Request::RegisterArtwork {
                access_token,
                title: title.clone(),
            })
            .await?
        {
            Response::Artwork { artwork } => Ok(artwork),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_artworks(&self) -> Result<Vec<Artwork>> {
        match self
            .authed(|access_token| Request::ListArtworks { access_token })
            .await?
        {
            Response::Artworks { artworks } => Ok(artworks),
            other => Err(unexpected(other)),
        }
    }

    /// Invite another user; returns the invitation and a shareable link
    pub async fn invite_collaborator(
        &self,
        exhibit_id: Uuid,
        invitee_username: &str,
    ) -> Result<(Invitation, String)> {
        let invitee_username = invitee_username.to_string();
        match self
            .authed(|access_token| Request::InviteCollaborator {
                access_token,
                exhibit_id,
                invitee_username: invitee_username.clone(),
            })
            .await?
        {
            Response::Invited {
                invitation,
                join_link,
            } => Ok((invitation, join_link)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn respond_invitation(&self, token: &str, accept: bool) -> Result<InvitationStatus> {
        let token = token.to_string();
        match self
            .authed(|access_token| Request::RespondInvitation {
                access_token,
                token: token.clone(),
                accept,
            })
            .await?
        {
            Response::InvitationResponded { status, .. } => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Send an authenticated request, refreshing and replaying once if
    /// the access token has gone stale
    async fn authed<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(String) -> Request,
    {
        let access = self
            .auth
            .lock()
            .await
            .as_ref()
            .map(|t| t.access.clone())
            .ok_or(Error::NotLoggedIn)?;

        match self.call(build(access.clone())).await {
            Err(e) if e.is_auth_expired() => {
                debug!("Access token expired, entering refresh path");
                let access = self.refresh_after(&access).await?;
                self.call(build(access)).await
            }
            other => other,
        }
    }

    /// Rotate the token pair, coalescing concurrent refreshes
    ///
    /// The lock is held for the whole refresh, so at most one refresh
    /// call is ever in flight. A waiter whose stale token no longer
    /// matches the stored one knows someone else already rotated and
    /// reuses the result. A failed refresh tears the session down.
    async fn refresh_after(&self, stale_access: &str) -> Result<String> {
        let mut guard = self.auth.lock().await;
        let tokens = guard.as_ref().ok_or(Error::SessionExpired)?;

        if tokens.access != stale_access {
            debug!("Token already rotated by another caller");
            return Ok(tokens.access.clone());
        }

        let refresh_token = tokens.refresh.clone();
        match self.call(Request::Refresh { refresh_token }).await {
            Ok(Response::Tokens {
                access_token,
                refresh_token,
                ..
            }) => {
                *guard = Some(AuthTokens {
                    access: access_token.clone(),
                    refresh: refresh_token,
                });
                debug!("Token pair refreshed");
                Ok(access_token)
            }
            Ok(_) | Err(_) => {
                warn!("Refresh failed, tearing down session");
                *guard = None;
                Err(Error::SessionExpired)
            }
        }
    }

    /// One request, one response, over a fresh connection
    async fn call(&self, request: Request) -> Result<Response> {
        let mut stream = TcpStream::connect(self.addr).await?;
        write_frame(&mut stream, &request).await?;
        let response: Response = read_frame(&mut stream).await?;

        match response {
            Response::Error { code, message } => Err(Error::Api { code, message }),
            other => Ok(other),
        }
    }
}

fn unexpected(response: Response) -> Error {
    Error::Protocol(format!("Unexpected response: {:?}", response))
}
