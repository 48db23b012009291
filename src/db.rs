use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::notify::ContactForm;
use crate::profile::Profile;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            source       TEXT PRIMARY KEY,
            profile_json TEXT NOT NULL,
            built_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Contact messages kept when mail delivery is unavailable
        CREATE TABLE IF NOT EXISTS contact_messages (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            email      TEXT NOT NULL,
            message    TEXT NOT NULL,
            recipient  TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_messages_created ON contact_messages(created_at);
        ",
    )?;
    Ok(())
}

// ── Profile cache ──

pub fn save_profile(conn: &Connection, source: &str, profile: &Profile) -> Result<()> {
    let json = serde_json::to_string(profile)?;
    conn.execute(
        "INSERT INTO profiles (source, profile_json) VALUES (?1, ?2)
         ON CONFLICT(source) DO UPDATE SET
            profile_json = excluded.profile_json,
            built_at = datetime('now')",
        rusqlite::params![source, json],
    )?;
    Ok(())
}

/// Cached profile for `source`. A row that no longer parses counts as a miss.
pub fn load_profile(conn: &Connection, source: &str) -> Result<Option<Profile>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT profile_json FROM profiles WHERE source = ?1",
            rusqlite::params![source],
            |row| row.get(0),
        )
        .optional()?;

    Ok(json.and_then(|j| match serde_json::from_str(&j) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(source, "Discarding unreadable cached profile: {}", e);
            None
        }
    }))
}

// ── Contact messages ──

pub struct MessageRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub recipient: String,
    pub created_at: String,
}

pub fn store_message(conn: &Connection, form: &ContactForm, recipient: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO contact_messages (name, email, message, recipient) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![form.name, form.email, form.message, recipient],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn fetch_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, message, recipient, created_at
         FROM contact_messages ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                message: row.get(3)?,
                recipient: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Extractor;

    fn open() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("nested/folio.sqlite")).unwrap();
        init_schema(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn profile_round_trips_and_overwrites() {
        let (_dir, conn) = open();
        let ex = Extractor::default();
        assert!(load_profile(&conn, "cv.pdf").unwrap().is_none());

        let first = ex.extract("Jane Roe\njane@x.com");
        save_profile(&conn, "cv.pdf", &first).unwrap();
        assert_eq!(load_profile(&conn, "cv.pdf").unwrap(), Some(first));

        let second = ex.extract("Sam Lee\nsam@y.com");
        save_profile(&conn, "cv.pdf", &second).unwrap();
        let loaded = load_profile(&conn, "cv.pdf").unwrap().unwrap();
        assert_eq!(loaded.name, "Sam Lee");
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let (_dir, conn) = open();
        conn.execute(
            "INSERT INTO profiles (source, profile_json) VALUES ('cv.pdf', '{not json')",
            [],
        )
        .unwrap();
        assert!(load_profile(&conn, "cv.pdf").unwrap().is_none());
    }

    #[test]
    fn messages_are_listed_in_order() {
        let (_dir, conn) = open();
        let a = ContactForm::new("Ann", "ann@x.com", "Hello").unwrap();
        let b = ContactForm::new("Bo", "bo@y.com", "Hi again").unwrap();
        let id_a = store_message(&conn, &a, "me@site.dev").unwrap();
        let id_b = store_message(&conn, &b, "me@site.dev").unwrap();
        assert!(id_a < id_b);

        let rows = fetch_messages(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ann");
        assert_eq!(rows[1].message, "Hi again");
        assert_eq!(rows[1].recipient, "me@site.dev");
        assert!(!rows[0].created_at.is_empty());
    }
}
