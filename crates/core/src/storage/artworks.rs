//! Artwork storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::Artwork;

pub struct ArtworkStore<'a> {
    conn: &'a Connection,
}

impl<'a> ArtworkStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a new artwork
    #[instrument(skip(self, artwork), fields(artist_id = %artwork.artist_id))]
    pub fn create(&self, artwork: &Artwork) -> Result<()> {
        self.conn.execute(
            "INSERT INTO artworks (id, artist_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                artwork.id.to_string(),
                artwork.artist_id.to_string(),
                artwork.title,
                artwork.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find artwork by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Artwork>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, artist_id, title, created_at FROM artworks WHERE id = ?1",
        )?;

        let artwork = stmt
            .query_row(params![id.to_string()], |row| {
                Ok(Artwork {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    artist_id: parse_uuid(&row.get::<_, String>(1)?)?,
                    title: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?)?,
                })
            })
            .optional()?;

        Ok(artwork)
    }

    /// List an artist's pieces, newest first
    pub fn list_by_artist(&self, artist_id: Uuid) -> Result<Vec<Artwork>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, artist_id, title, created_at FROM artworks
             WHERE artist_id = ?1 ORDER BY created_at DESC",
        )?;

        let artworks = stmt
            .query_map(params![artist_id.to_string()], |row| {
                Ok(Artwork {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    artist_id: parse_uuid(&row.get::<_, String>(1)?)?,
                    title: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(artworks)
    }

    /// Delete an artwork
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM artworks WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Database;
    use crate::models::{Artwork, User};

    #[test]
    fn test_create_and_list() {
        let db = Database::open_in_memory().unwrap();
        let artist = User::new("ada".into(), "hash".into());
        db.users().create(&artist).unwrap();

        let first = Artwork::new(artist.id, "Dusk".into());
        let second = Artwork::new(artist.id, "Dawn".into());
        db.artworks().create(&first).unwrap();
        db.artworks().create(&second).unwrap();

        let listed = db.artworks().list_by_artist(artist.id).unwrap();
        assert_eq!(listed.len(), 2);

        let found = db.artworks().find_by_id(first.id).unwrap().unwrap();
        assert_eq!(found.title, "Dusk");
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let artist = User::new("ada".into(), "hash".into());
        db.users().create(&artist).unwrap();

        let piece = Artwork::new(artist.id, "Dusk".into());
        db.artworks().create(&piece).unwrap();
        db.artworks().delete(piece.id).unwrap();

        assert!(db.artworks().find_by_id(piece.id).unwrap().is_none());
    }
}
