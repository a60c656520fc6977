mod sessions;

pub use sessions::SessionRecord;

use crate::error::{DracoonError, Result};
use directories::ProjectDirs;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "Dracoon";
const APPLICATION: &str = "dracoon-rs";
const DB_FILE_NAME: &str = "sessions.db";

/// 基于 SQLite 的 OAuth 会话存储。
/// 每次操作都会打开连接并确保表结构存在，调用方无需关心初始化顺序。
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// 使用平台数据目录下的默认数据库文件。
    pub fn open_default() -> Result<Self> {
        Self::open_at(database_path()?)
    }

    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let store = TokenStore { path: path.into() };
        store.with_connection(|_| Ok(()))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_connection<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = open_connection(&self.path)?;
        operation(&conn)
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            DracoonError::Storage(format!("failed to create database directory {dir:?}: {e}"))
        })?;
    }

    let conn = Connection::open(path)
        .map_err(|e| DracoonError::Storage(format!("failed to open SQLite database: {e}")))?;
    apply_migrations(&conn)?;
    Ok(conn)
}

fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(sessions::SESSIONS_TABLE_SCHEMA)
        .map_err(|e| DracoonError::Storage(format!("failed to initialize database schema: {e}")))?;
    Ok(())
}

fn database_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        DracoonError::Storage("failed to resolve application data directory".to_string())
    })?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

pub(crate) fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
