use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use directories::ProjectDirs;
use rusqlite::{Connection, params};

use crate::chat::directory::PartnerEntry;
use crate::error::Result;

// Caching the resolved directory so a failed refresh can keep showing the
// last-known-good list instead of blanking it.
pub struct PartnerCache {
    conn: Connection,
}

impl PartnerCache {
    pub fn default_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "Marketchat")?;
        Some(proj.data_dir().join("cache.sqlite"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// In-memory cache for tests and hosts that do not want persistence.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS partners (
                chat_id TEXT PRIMARY KEY,
                partner_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                raw_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Insert or refresh one row per chat identifier.
    pub fn upsert(&mut self, entries: &[PartnerEntry]) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let tx = self.conn.transaction()?;
        for entry in entries {
            let raw = serde_json::to_string(entry)?;
            tx.execute(
                r#"
                INSERT INTO partners (chat_id, partner_id, display_name, updated_at, raw_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(chat_id) DO UPDATE SET
                    partner_id=excluded.partner_id,
                    display_name=excluded.display_name,
                    updated_at=excluded.updated_at,
                    raw_json=excluded.raw_json
                "#,
                params![entry.chat_id, entry.partner_id, entry.display_name, now, raw],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Cached entries, most recently refreshed first.
    pub fn entries(&self, limit: Option<usize>) -> Result<Vec<PartnerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT raw_json FROM partners ORDER BY updated_at DESC, display_name ASC LIMIT ?1",
        )?;
        let limit = limit.unwrap_or(500) as i64;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(serde_json::from_str(&raw?)?);
        }
        Ok(out)
    }
}
