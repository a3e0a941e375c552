// Persistent cache store backed by SQLite
// Author: kelexine (https://github.com/kelexine)

use super::models::StoreSummary;
use super::storage::{require_get, CacheStorage};
use crate::error::{AgentError, Result};
use crate::models::{AgentResponse, RequestKey, ResponseType};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Schema for cache stores. Store ids grow monotonically, so ordering by id
/// is creation order.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS entries (
    store_id INTEGER NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    response_type TEXT NOT NULL,
    response_url TEXT,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (store_id, method, url),
    FOREIGN KEY (store_id) REFERENCES stores(id)
);

CREATE INDEX IF NOT EXISTS idx_entries_key ON entries(method, url);
"#;

const SELECT_ENTRY: &str = "SELECT e.status, e.response_type, e.response_url, e.headers, e.body \
     FROM entries e JOIN stores s ON s.id = e.store_id";

/// Cache stores kept in a SQLite database.
///
/// Survives restarts: a process started with a new cache version still sees
/// the previous version's store and evicts it on activation. Cheap to clone;
/// clones share one connection.
#[derive(Clone)]
pub struct SqliteCacheStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCacheStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            AgentError::CacheStorage(format!(
                "Failed to open cache database at {}: {}",
                path.display(),
                e
            ))
        })?;
        conn.execute_batch(CACHE_SCHEMA).map_err(db_error)?;

        info!("Opened cache database {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path()?)
    }

    /// `offline-agent/cache.db` under the platform cache directory.
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
            .ok_or_else(|| AgentError::Config("Could not determine cache directory".to_string()))?;

        Ok(cache_dir.join("offline-agent").join("cache.db"))
    }

    /// Run a database operation off the async runtime.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            op(&mut *conn)
        })
        .await
        .map_err(|e| AgentError::Internal(format!("Cache database task failed: {}", e)))?
    }
}

fn db_error(e: rusqlite::Error) -> AgentError {
    AgentError::CacheStorage(e.to_string())
}

fn store_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| {
        row.get(0)
    })
    .optional()
    .map_err(db_error)
}

fn ensure_store(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = store_id(conn, name)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO stores (name) VALUES (?1)", params![name])
        .map_err(db_error)?;
    debug!("Creating cache store {}", name);
    Ok(conn.last_insert_rowid())
}

fn insert_entry(conn: &Connection, store: i64, key: &RequestKey, response: &AgentResponse) -> Result<()> {
    let headers = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR REPLACE INTO entries \
         (store_id, method, url, status, response_type, response_url, headers, body) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            store,
            key.method(),
            key.url(),
            response.status,
            response.response_type.as_str(),
            response.url,
            headers,
            response.body.as_ref(),
        ],
    )
    .map_err(db_error)?;
    Ok(())
}

/// Raw columns of one stored entry.
struct StoredEntry {
    status: u16,
    response_type: String,
    url: Option<String>,
    headers: String,
    body: Vec<u8>,
}

impl StoredEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            response_type: row.get(1)?,
            url: row.get(2)?,
            headers: row.get(3)?,
            body: row.get(4)?,
        })
    }

    fn into_response(self) -> Result<AgentResponse> {
        let response_type: ResponseType = self.response_type.parse()?;
        Ok(AgentResponse {
            status: self.status,
            response_type,
            url: self.url,
            headers: serde_json::from_str(&self.headers)?,
            body: self.body.into(),
        })
    }
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.run(move |conn| ensure_store(conn, &name).map(|_| ())).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM stores ORDER BY id")
                .map_err(db_error)?;
            let names = stmt
                .query_map([], |row| row.get(0))
                .map_err(db_error)?
                .collect::<rusqlite::Result<Vec<String>>>()
                .map_err(db_error)?;
            Ok(names)
        })
        .await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.run(move |conn| {
            let tx = conn.transaction().map_err(db_error)?;
            let Some(id) = store_id(&tx, &name)? else {
                return Ok(false);
            };
            let entries = tx
                .execute("DELETE FROM entries WHERE store_id = ?1", params![id])
                .map_err(db_error)?;
            tx.execute("DELETE FROM stores WHERE id = ?1", params![id])
                .map_err(db_error)?;
            tx.commit().map_err(db_error)?;

            debug!("Deleted cache store {} ({} entries)", name, entries);
            Ok(true)
        })
        .await
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<AgentResponse>> {
        if !key.is_get() {
            return Ok(None);
        }
        let key = key.clone();
        self.run(move |conn| {
            let sql = format!(
                "{} WHERE e.method = ?1 AND e.url = ?2 ORDER BY s.id LIMIT 1",
                SELECT_ENTRY
            );
            conn.query_row(&sql, params![key.method(), key.url()], StoredEntry::from_row)
                .optional()
                .map_err(db_error)?
                .map(StoredEntry::into_response)
                .transpose()
        })
        .await
    }

    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<AgentResponse>> {
        if !key.is_get() {
            return Ok(None);
        }
        let name = name.to_string();
        let key = key.clone();
        self.run(move |conn| {
            let sql = format!(
                "{} WHERE s.name = ?1 AND e.method = ?2 AND e.url = ?3",
                SELECT_ENTRY
            );
            conn.query_row(&sql, params![name, key.method(), key.url()], StoredEntry::from_row)
                .optional()
                .map_err(db_error)?
                .map(StoredEntry::into_response)
                .transpose()
        })
        .await
    }

    async fn put(&self, name: &str, key: RequestKey, response: AgentResponse) -> Result<()> {
        require_get(&key)?;
        let name = name.to_string();
        self.run(move |conn| {
            let tx = conn.transaction().map_err(db_error)?;
            let store = ensure_store(&tx, &name)?;
            insert_entry(&tx, store, &key, &response)?;
            tx.commit().map_err(db_error)
        })
        .await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, AgentResponse)>) -> Result<()> {
        for (key, _) in &entries {
            require_get(key)?;
        }
        let name = name.to_string();
        self.run(move |conn| {
            // Dropping the transaction on error rolls every insert back
            let tx = conn.transaction().map_err(db_error)?;
            let store = ensure_store(&tx, &name)?;
            for (key, response) in &entries {
                insert_entry(&tx, store, key, response)?;
            }
            tx.commit().map_err(db_error)
        })
        .await
    }

    async fn summaries(&self) -> Result<Vec<StoreSummary>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT s.name, COUNT(e.url) FROM stores s \
                     LEFT JOIN entries e ON e.store_id = s.id \
                     GROUP BY s.id ORDER BY s.id",
                )
                .map_err(db_error)?;
            let summaries = stmt
                .query_map([], |row| {
                    Ok(StoreSummary {
                        name: row.get(0)?,
                        entries: row.get::<_, i64>(1)? as usize,
                    })
                })
                .map_err(db_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_error)?;
            Ok(summaries)
        })
        .await
    }
}
