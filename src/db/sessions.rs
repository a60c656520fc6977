//! 会话持久化：每个 DRACOON 实例（base_url）最多保存一条令牌记录。

use rusqlite::{params, OptionalExtension};

use super::{current_timestamp_millis, TokenStore};
use crate::error::{DracoonError, Result};

pub(crate) const SESSIONS_TABLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    base_url TEXT PRIMARY KEY,
    access_token TEXT NOT NULL,
    refresh_token TEXT,
    token_type TEXT,
    scope TEXT,
    expires_at INTEGER,
    updated_at_millis INTEGER NOT NULL
);";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub base_url: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    /// Unix 秒级时间戳。
    pub expires_at: Option<i64>,
    pub updated_at_millis: i64,
}

impl TokenStore {
    pub fn upsert_session(&self, record: &SessionRecord) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sessions (
                    base_url,
                    access_token,
                    refresh_token,
                    token_type,
                    scope,
                    expires_at,
                    updated_at_millis
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(base_url) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    token_type = excluded.token_type,
                    scope = excluded.scope,
                    expires_at = excluded.expires_at,
                    updated_at_millis = excluded.updated_at_millis",
                params![
                    record.base_url,
                    record.access_token,
                    record.refresh_token,
                    record.token_type,
                    record.scope,
                    record.expires_at,
                    current_timestamp_millis(),
                ],
            )
            .map_err(|e| DracoonError::Storage(format!("failed to upsert session: {e}")))?;
            Ok(())
        })
    }

    pub fn load_session(&self, base_url: &str) -> Result<Option<SessionRecord>> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT
                    base_url,
                    access_token,
                    refresh_token,
                    token_type,
                    scope,
                    expires_at,
                    updated_at_millis
                FROM sessions
                WHERE base_url = ?",
                params![base_url],
                |row| {
                    Ok(SessionRecord {
                        base_url: row.get(0)?,
                        access_token: row.get(1)?,
                        refresh_token: row.get(2)?,
                        token_type: row.get(3)?,
                        scope: row.get(4)?,
                        expires_at: row.get(5)?,
                        updated_at_millis: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|e| DracoonError::Storage(format!("failed to read session: {e}")))
        })
    }

    pub fn clear_session(&self, base_url: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM sessions WHERE base_url = ?", params![base_url])
                .map_err(|e| DracoonError::Storage(format!("failed to clear session: {e}")))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, TokenStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = TokenStore::open_at(temp_dir.path().join("nested").join("sessions.db")).unwrap();
        (temp_dir, store)
    }

    fn record(base_url: &str, access_token: &str) -> SessionRecord {
        SessionRecord {
            base_url: base_url.to_string(),
            access_token: access_token.to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: Some("bearer".to_string()),
            scope: Some("all".to_string()),
            expires_at: Some(1_700_000_000),
            updated_at_millis: 0,
        }
    }

    #[test]
    fn upsert_then_load() {
        let (_temp, store) = setup_store();
        store.upsert_session(&record("https://a.example", "first")).unwrap();

        let loaded = store.load_session("https://a.example").unwrap().unwrap();
        assert_eq!(loaded.access_token, "first");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(loaded.expires_at, Some(1_700_000_000));
        assert!(loaded.updated_at_millis > 0);
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let (_temp, store) = setup_store();
        store.upsert_session(&record("https://a.example", "first")).unwrap();
        store.upsert_session(&record("https://a.example", "second")).unwrap();

        let loaded = store.load_session("https://a.example").unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
    }

    #[test]
    fn sessions_are_scoped_by_instance() {
        let (_temp, store) = setup_store();
        store.upsert_session(&record("https://a.example", "a")).unwrap();
        store.upsert_session(&record("https://b.example", "b")).unwrap();
        store.clear_session("https://a.example").unwrap();

        assert!(store.load_session("https://a.example").unwrap().is_none());
        assert_eq!(
            store.load_session("https://b.example").unwrap().unwrap().access_token,
            "b"
        );
    }
}
