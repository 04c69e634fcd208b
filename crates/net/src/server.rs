//! TCP server exposing the Salon API
//!
//! Connections are request/response: each frame carries one `Request`
//! and gets exactly one `Response` back on the same connection.
//! Failures inside a handler become `Response::Error`; only transport
//! faults drop the connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use salon_core::auth::{generate_invite_token, generate_token, hash_password, verify_password};
use salon_core::models::{
    Artwork, AuthSession, Environment, ExhibitKind, Invitation, InvitationStatus, Participant,
    User, MAX_COLLABORATORS,
};
use salon_core::storage::Database;
use salon_core::view_mode::{InspectionMode, ViewMode};
use salon_core::{DraftSession, Error as CoreError, ExhibitDraft};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::join_link::JoinLink;
use crate::protocol::{
    DraftPayload, DraftView, ErrorCode, ParticipantProgress, Request, Response, SlotOp,
};

/// Access token lifetime (8 hours)
pub const ACCESS_TTL_MINUTES: i64 = 8 * 60;

/// Refresh token lifetime (7 days)
pub const REFRESH_TTL_HOURS: i64 = 7 * 24;

/// Database handle shared across connection tasks
pub type SharedDb = Arc<Mutex<Database>>;

/// Salon API server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Start a new server on the given port
    pub async fn start(port: u16, db: SharedDb) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(accept_loop(listener, db, bound_addr, shutdown_rx));

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    db: SharedDb,
    public_addr: SocketAddr,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        let db = db.clone();
                        tokio::spawn(handle_connection(stream, addr, db, public_addr));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Serve one connection until the peer hangs up
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    db: SharedDb,
    public_addr: SocketAddr,
) {
    loop {
        let request: Request = match read_frame(&mut stream).await {
            Ok(req) => req,
            Err(Error::ConnectionClosed) => {
                debug!(addr = %addr, "Connection closed");
                break;
            }
            Err(e) => {
                warn!(addr = %addr, error = %e, "Read error");
                break;
            }
        };

        let response = dispatch(request, &db, public_addr).await;

        if let Err(e) = write_frame(&mut stream, &response).await {
            warn!(addr = %addr, error = %e, "Write error");
            break;
        }
    }
}

/// Route a request to its handler
async fn dispatch(request: Request, db: &SharedDb, public_addr: SocketAddr) -> Response {
    let db = db.lock().await;
    let result = match request {
        Request::Register { username, password } => register(&db, username, password),
        Request::Login { username, password } => login(&db, username, password),
        Request::Refresh { refresh_token } => refresh(&db, &refresh_token),
        Request::Logout { access_token } => logout(&db, &access_token),
        Request::ListExhibits { access_token } => list_exhibits(&db, &access_token),
        Request::FetchDraft {
            access_token,
            exhibit_id,
            mode,
            join_token,
        } => fetch_draft(&db, &access_token, exhibit_id, mode, join_token.as_deref()),
        Request::SaveDraft {
            access_token,
            payload,
        } => save_draft(&db, &access_token, payload),
        Request::PublishDraft {
            access_token,
            exhibit_id,
        } => publish_draft(&db, &access_token, exhibit_id),
        Request::RegisterArtwork {
            access_token,
            title,
        } => register_artwork(&db, &access_token, title),
        Request::ListArtworks { access_token } => list_artworks(&db, &access_token),
        Request::InviteCollaborator {
            access_token,
            exhibit_id,
            invitee_username,
        } => invite_collaborator(&db, &access_token, exhibit_id, &invitee_username, public_addr),
        Request::RespondInvitation {
            access_token,
            token,
            accept,
        } => respond_invitation(&db, &access_token, &token, accept),
    };

    match result {
        Ok(response) => response,
        Err(reject) => Response::Error {
            code: reject.code,
            message: reject.message,
        },
    }
}

/// A request the server will not carry out
struct Reject {
    code: ErrorCode,
    message: String,
}

impl Reject {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<CoreError> for Reject {
    fn from(e: CoreError) -> Self {
        let code = match &e {
            CoreError::Authentication(_) => ErrorCode::AuthInvalid,
            CoreError::PermissionDenied(_)
            | CoreError::SlotAccessDenied { .. }
            | CoreError::ArtworkNotOwned { .. } => ErrorCode::Denied,
            CoreError::NotFound(_) | CoreError::NoSuchParticipant(_) => ErrorCode::NotFound,
            CoreError::AlreadyParticipant(_)
            | CoreError::DuplicateArtwork(_)
            | CoreError::RosterFull(_)
            | CoreError::Invitation(_) => ErrorCode::Conflict,
            CoreError::Database(_) | CoreError::Io(_) | CoreError::Serialization(_) => {
                error!(error = %e, "Storage failure while handling request");
                return Reject::new(ErrorCode::Invalid, "Internal error");
            }
            _ => ErrorCode::Invalid,
        };
        Reject {
            code,
            message: e.to_string(),
        }
    }
}

type HandlerResult = std::result::Result<Response, Reject>;

/// Resolve a bearer token to its user
///
/// An expired access token is the one retryable failure; the client
/// is expected to refresh and replay.
fn authenticate(db: &Database, access_token: &str) -> std::result::Result<User, Reject> {
    let session = db
        .users()
        .find_session_by_access_token(access_token)?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Unknown access token"))?;

    if !session.access_is_valid() {
        return Err(Reject::new(ErrorCode::AuthExpired, "Access token expired"));
    }

    db.users()
        .find_by_id(session.user_id)?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Session user no longer exists"))
}

fn load_draft(db: &Database, exhibit_id: Uuid) -> std::result::Result<ExhibitDraft, Reject> {
    db.exhibits()
        .load(exhibit_id)?
        .ok_or_else(|| Reject::new(ErrorCode::NotFound, "No such exhibit"))
}

fn register(db: &Database, username: String, password: String) -> HandlerResult {
    let username = username.trim().to_string();
    if username.len() < 3 {
        return Err(Reject::new(
            ErrorCode::Invalid,
            "Username must be at least 3 characters",
        ));
    }
    if password.len() < 8 {
        return Err(Reject::new(
            ErrorCode::Invalid,
            "Password must be at least 8 characters",
        ));
    }
    if db.users().find_by_username(&username)?.is_some() {
        return Err(Reject::new(ErrorCode::Conflict, "Username is taken"));
    }

    let user = User::new(username, hash_password(&password)?);
    db.users().create(&user)?;

    info!(user_id = %user.id, "User registered");
    Ok(Response::Registered { user_id: user.id })
}

fn login(db: &Database, username: String, password: String) -> HandlerResult {
    let user = db
        .users()
        .find_by_username(username.trim())?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Invalid credentials"))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(Reject::new(ErrorCode::AuthInvalid, "Invalid credentials"));
    }

    let session = AuthSession::new(
        user.id,
        generate_token(),
        generate_token(),
        ACCESS_TTL_MINUTES,
        REFRESH_TTL_HOURS,
    );
    db.users().create_session(&session)?;
    db.users().update_last_login(user.id)?;

    info!(user_id = %user.id, "User logged in");
    Ok(Response::Tokens {
        user_id: user.id,
        username: user.username,
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    })
}

fn refresh(db: &Database, refresh_token: &str) -> HandlerResult {
    let mut session = db
        .users()
        .find_session_by_refresh_token(refresh_token)?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Unknown refresh token"))?;

    if !session.refresh_is_valid() {
        db.users().delete_session(session.id)?;
        return Err(Reject::new(ErrorCode::AuthInvalid, "Refresh token expired"));
    }

    let user = db
        .users()
        .find_by_id(session.user_id)?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Session user no longer exists"))?;

    session.rotate(
        generate_token(),
        generate_token(),
        ACCESS_TTL_MINUTES,
        REFRESH_TTL_HOURS,
    );
    db.users().update_session(&session)?;

    debug!(user_id = %user.id, "Token pair rotated");
    Ok(Response::Tokens {
        user_id: user.id,
        username: user.username,
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    })
}

fn logout(db: &Database, access_token: &str) -> HandlerResult {
    // A stale access token still names the session to tear down
    let session = db
        .users()
        .find_session_by_access_token(access_token)?
        .ok_or_else(|| Reject::new(ErrorCode::AuthInvalid, "Unknown access token"))?;

    db.users().delete_session(session.id)?;

    info!(user_id = %session.user_id, "User logged out");
    Ok(Response::LoggedOut)
}

fn list_exhibits(db: &Database, access_token: &str) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let exhibits = db.exhibits().list_for_user(user.id)?;
    Ok(Response::Exhibits { exhibits })
}

fn fetch_draft(
    db: &Database,
    access_token: &str,
    exhibit_id: Uuid,
    requested: Option<InspectionMode>,
    join_token: Option<&str>,
) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let draft = load_draft(db, exhibit_id)?;
    let mode = resolve_view_mode(db, &draft, user.id, requested, join_token)?;

    let session = DraftSession::open(draft, mode)?;
    let progress = match session.progress() {
        Ok(rows) => rows
            .into_iter()
            .map(|(p, status)| ParticipantProgress {
                participant_id: p.id,
                display_name: p.display_name,
                status,
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    Ok(Response::Draft(DraftView {
        draft: session.into_draft(),
        mode,
        progress,
    }))
}

/// Decide which view of a draft the requester gets
///
/// The owner gets `Owner`, or a read-only inspection view on request.
/// A roster collaborator gets `Collaborator`. Everyone else is denied,
/// with the join-link token only sharpening the denial message.
fn resolve_view_mode(
    db: &Database,
    draft: &ExhibitDraft,
    requester: Uuid,
    requested: Option<InspectionMode>,
    join_token: Option<&str>,
) -> std::result::Result<ViewMode, Reject> {
    if draft.roster().owner().id == requester {
        return Ok(match requested {
            Some(inspection) => ViewMode::from(inspection),
            None => ViewMode::Owner,
        });
    }
    if requested.is_some() {
        return Err(Reject::new(
            ErrorCode::Denied,
            "Inspection views are reserved for the owner",
        ));
    }
    if draft.roster().contains(requester) {
        return Ok(ViewMode::Collaborator {
            participant_id: requester,
        });
    }

    if let Some(token) = join_token {
        let invitation = db
            .invitations()
            .find_by_token(token)?
            .filter(|inv| inv.exhibit_id == draft.id && inv.invitee_id == requester)
            .ok_or_else(|| {
                Reject::new(ErrorCode::Denied, "Join link does not match this exhibit")
            })?;
        let message = match invitation.effective_status() {
            InvitationStatus::Pending => "Invitation has not been accepted yet",
            InvitationStatus::Accepted => "No longer on the roster",
            InvitationStatus::Declined => "Invitation was declined",
            InvitationStatus::Expired => "Invitation has expired",
        };
        return Err(Reject::new(ErrorCode::Denied, message));
    }

    Err(Reject::new(
        ErrorCode::Denied,
        "Not a participant in this exhibit",
    ))
}

fn save_draft(db: &Database, access_token: &str, payload: DraftPayload) -> HandlerResult {
    let user = authenticate(db, access_token)?;

    let (draft, mode) = match payload.exhibit_id {
        Some(id) => {
            let draft = load_draft(db, id)?;
            let mode = if draft.roster().owner().id == user.id {
                ViewMode::Owner
            } else if draft.roster().contains(user.id) {
                ViewMode::Collaborator {
                    participant_id: user.id,
                }
            } else {
                return Err(Reject::new(
                    ErrorCode::Denied,
                    "Not a participant in this exhibit",
                ));
            };
            (draft, mode)
        }
        None => {
            let owner = Participant {
                id: user.id,
                display_name: user.username.clone(),
            };
            let draft = ExhibitDraft::new(
                String::new(),
                owner,
                payload.kind.unwrap_or(ExhibitKind::Solo),
            );
            (draft, ViewMode::Owner)
        }
    };

    let mut session = DraftSession::open(draft, mode)?;

    if let Some(title) = payload.title {
        session.set_title(title)?;
    }
    if let Some(description) = payload.description {
        let description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        session.set_description(description)?;
    }
    if let Some(tags) = payload.tags {
        session.set_tags(tags)?;
    }
    if let Some(kind) = payload.kind {
        session.set_kind(kind)?;
    }
    if let Some(schedule) = payload.schedule {
        session.set_schedule(schedule.starts_at, schedule.ends_at)?;
    }
    if let Some(env_id) = payload.environment_id {
        let environment = Environment::by_id(env_id)
            .ok_or_else(|| Reject::new(ErrorCode::NotFound, "No such environment"))?;
        session.select_environment(environment)?;
    }
    for id in payload.remove_collaborators {
        session.remove_collaborator(id)?;
    }
    for op in payload.slot_ops {
        match op {
            SlotOp::Assign { artwork_id } => {
                let artwork = db
                    .artworks()
                    .find_by_id(artwork_id)?
                    .ok_or_else(|| Reject::new(ErrorCode::NotFound, "No such artwork"))?;
                session.assign_artwork(&artwork)?;
            }
            SlotOp::Clear { slot } => {
                session.clear_slot(slot)?;
            }
        }
    }

    let draft = session.into_draft();
    db.exhibits().save(&draft)?;

    debug!(exhibit_id = %draft.id, "Draft saved");
    Ok(Response::Saved { draft })
}

fn publish_draft(db: &Database, access_token: &str, exhibit_id: Uuid) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let draft = load_draft(db, exhibit_id)?;

    if draft.roster().owner().id != user.id {
        return Err(Reject::new(ErrorCode::Denied, "Only the owner may publish"));
    }

    let mut session = DraftSession::open(draft, ViewMode::Owner)?;
    session.publish()?;

    let draft = session.into_draft();
    db.exhibits().save(&draft)?;

    info!(exhibit_id = %draft.id, "Exhibit published");
    Ok(Response::Published {
        exhibit_id: draft.id,
    })
}

fn register_artwork(db: &Database, access_token: &str, title: String) -> HandlerResult {
    let user = authenticate(db, access_token)?;

    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(Reject::new(ErrorCode::Invalid, "Artwork title is required"));
    }

    let artwork = Artwork::new(user.id, title);
    db.artworks().create(&artwork)?;

    Ok(Response::Artwork { artwork })
}

fn list_artworks(db: &Database, access_token: &str) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let artworks = db.artworks().list_by_artist(user.id)?;
    Ok(Response::Artworks { artworks })
}

fn invite_collaborator(
    db: &Database,
    access_token: &str,
    exhibit_id: Uuid,
    invitee_username: &str,
    public_addr: SocketAddr,
) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let draft = load_draft(db, exhibit_id)?;

    if draft.roster().owner().id != user.id {
        return Err(Reject::new(ErrorCode::Denied, "Only the owner may invite"));
    }
    if draft.kind != ExhibitKind::Collaborative {
        return Err(Reject::new(
            ErrorCode::Invalid,
            "Solo exhibits do not take collaborators",
        ));
    }
    if draft.roster().collaborators().len() >= MAX_COLLABORATORS {
        return Err(Reject::new(ErrorCode::Conflict, "Roster is full"));
    }

    let invitee = db
        .users()
        .find_by_username(invitee_username.trim())?
        .ok_or_else(|| Reject::new(ErrorCode::NotFound, "No such user"))?;
    if invitee.id == user.id || draft.roster().contains(invitee.id) {
        return Err(Reject::new(ErrorCode::Conflict, "Already a participant"));
    }

    // One invitation per (exhibit, invitee); a dead one gets replaced
    if let Some(existing) = db.invitations().find_for_invitee(exhibit_id, invitee.id)? {
        match existing.effective_status() {
            InvitationStatus::Pending | InvitationStatus::Accepted => {
                return Err(Reject::new(ErrorCode::Conflict, "Already invited"));
            }
            InvitationStatus::Declined | InvitationStatus::Expired => {
                db.invitations().delete(existing.id)?;
            }
        }
    }

    let invitation = Invitation::new(exhibit_id, user.id, invitee.id, generate_invite_token());
    db.invitations().create(&invitation)?;

    let link = JoinLink::from_addr(link_addr(public_addr), exhibit_id, invitation.token.clone());

    info!(exhibit_id = %exhibit_id, invitee_id = %invitee.id, "Invitation sent");
    Ok(Response::Invited {
        invitation,
        join_link: link.to_url(),
    })
}

fn respond_invitation(
    db: &Database,
    access_token: &str,
    token: &str,
    accept: bool,
) -> HandlerResult {
    let user = authenticate(db, access_token)?;
    let invitation = db
        .invitations()
        .find_by_token(token)?
        .ok_or_else(|| Reject::new(ErrorCode::NotFound, "No such invitation"))?;

    if invitation.invitee_id != user.id {
        return Err(Reject::new(
            ErrorCode::Denied,
            "This invitation is for someone else",
        ));
    }

    match invitation.effective_status() {
        InvitationStatus::Pending => {}
        InvitationStatus::Expired => {
            db.invitations()
                .update_status(invitation.id, InvitationStatus::Expired)?;
            return Err(Reject::new(ErrorCode::Conflict, "Invitation has expired"));
        }
        _ => {
            return Err(Reject::new(
                ErrorCode::Conflict,
                "Invitation was already answered",
            ));
        }
    }

    if !accept {
        db.invitations()
            .update_status(invitation.id, InvitationStatus::Declined)?;
        info!(invitation_id = %invitation.id, "Invitation declined");
        return Ok(Response::InvitationResponded {
            exhibit_id: invitation.exhibit_id,
            status: InvitationStatus::Declined,
        });
    }

    let mut draft = load_draft(db, invitation.exhibit_id)?;
    draft.add_collaborator(Participant {
        id: user.id,
        display_name: user.username.clone(),
    })?;
    db.exhibits().save(&draft)?;
    db.invitations()
        .update_status(invitation.id, InvitationStatus::Accepted)?;

    info!(invitation_id = %invitation.id, exhibit_id = %invitation.exhibit_id, "Invitation accepted");
    Ok(Response::InvitationResponded {
        exhibit_id: invitation.exhibit_id,
        status: InvitationStatus::Accepted,
    })
}

/// Join links never carry the wildcard bind address
fn link_addr(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
    } else {
        addr
    }
}
