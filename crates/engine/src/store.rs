use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// String key/value storage scoped to one play session.
///
/// Survives client restarts within the session and is wiped when the
/// session ends.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
    /// Drops every key of this session.
    fn clear(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.items.lock().clear();
        Ok(())
    }
}

/// SQLite-backed session storage; several named sessions share one file.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db_path: PathBuf,
    session: String,
}

impl SqliteSessionStore {
    pub fn new(db_path: impl Into<PathBuf>, session: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            session: session.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn open(&self) -> anyhow::Result<Connection> {
        let path = self.db_path.clone();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create session dir: {}", dir.display()))?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open session db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        migrate(&conn)?;
        Ok(conn)
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM session_items WHERE session_id = ?1 AND key = ?2",
                (&self.session, key),
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("read session key {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO session_items (session_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value",
            (&self.session, key, value),
        )
        .with_context(|| format!("write session key {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM session_items WHERE session_id = ?1 AND key = ?2",
            (&self.session, key),
        )?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM session_items WHERE session_id = ?1",
            [&self.session],
        )?;
        Ok(())
    }
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    let v: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if v < 1 {
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS session_items (
  session_id TEXT NOT NULL,
  key TEXT NOT NULL,
  value TEXT NOT NULL,
  PRIMARY KEY (session_id, key)
);
"#,
        )?;

        conn.pragma_update(None, "user_version", 1_i64)?;
    }

    Ok(())
}
