//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            -- Auth sessions carrying a rotating token pair
            CREATE TABLE IF NOT EXISTS auth_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                access_token TEXT NOT NULL UNIQUE,
                refresh_token TEXT NOT NULL UNIQUE,
                access_expires_at TEXT NOT NULL,
                refresh_expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Artworks table
            CREATE TABLE IF NOT EXISTS artworks (
                id TEXT PRIMARY KEY,
                artist_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (artist_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Exhibits table
            -- The slot plan is not stored: it is recomputed from
            -- (environment, roster) on load.
            CREATE TABLE IF NOT EXISTS exhibits (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                kind TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                owner_id TEXT NOT NULL,
                environment_id TEXT,
                starts_at TEXT,
                ends_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            -- Collaborators in join order
            CREATE TABLE IF NOT EXISTS exhibit_collaborators (
                exhibit_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (exhibit_id, user_id),
                FOREIGN KEY (exhibit_id) REFERENCES exhibits(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Artwork placed in a slot
            CREATE TABLE IF NOT EXISTS slot_bindings (
                exhibit_id TEXT NOT NULL,
                slot INTEGER NOT NULL,
                artwork_id TEXT NOT NULL,
                PRIMARY KEY (exhibit_id, slot),
                FOREIGN KEY (exhibit_id) REFERENCES exhibits(id) ON DELETE CASCADE,
                FOREIGN KEY (artwork_id) REFERENCES artworks(id) ON DELETE CASCADE
            );

            -- Invitations table
            CREATE TABLE IF NOT EXISTS invitations (
                id TEXT PRIMARY KEY,
                exhibit_id TEXT NOT NULL,
                inviter_id TEXT NOT NULL,
                invitee_id TEXT NOT NULL,
                token TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'pending',
                sent_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (exhibit_id) REFERENCES exhibits(id) ON DELETE CASCADE,
                FOREIGN KEY (inviter_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (invitee_id) REFERENCES users(id) ON DELETE CASCADE,
                UNIQUE(exhibit_id, invitee_id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Session indexes (token lookup happens on every request)
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_access ON auth_sessions(access_token);
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_refresh ON auth_sessions(refresh_token);

            -- Artwork indexes
            CREATE INDEX IF NOT EXISTS idx_artworks_artist ON artworks(artist_id);

            -- Exhibit indexes
            CREATE INDEX IF NOT EXISTS idx_exhibits_owner ON exhibits(owner_id);
            CREATE INDEX IF NOT EXISTS idx_exhibits_updated ON exhibits(updated_at);
            CREATE INDEX IF NOT EXISTS idx_collaborators_user ON exhibit_collaborators(user_id);

            -- Invitation indexes
            CREATE INDEX IF NOT EXISTS idx_invitations_exhibit ON invitations(exhibit_id);
            CREATE INDEX IF NOT EXISTS idx_invitations_invitee ON invitations(invitee_id);
        "#,
    },
    Migration {
        version: 3,
        description: "Add expiry indexes for the background sweep",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_auth_sessions_refresh_expires
                ON auth_sessions(refresh_expires_at);
            CREATE INDEX IF NOT EXISTS idx_invitations_status_expires
                ON invitations(status, expires_at);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
