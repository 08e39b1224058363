//! SQLite cache of raw feed bodies, keyed by the SHA-256 of the feed URL.

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A cached feed body plus the time it was stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedBody {
    pub body: String,
    pub fetched_utc: i64,
}

/// Last good body per feed URL. Lets a regeneration run `--offline`.
pub struct Cache {
    conn: Mutex<Connection>,
}

impl Cache {
    /// Open or create cache at `path`. Creates parent dirs if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS feed_bodies (
                key TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                body BLOB NOT NULL,
                fetched_utc INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Cache key for a feed URL. Trailing slashes and surrounding whitespace are ignored.
    pub fn key_for(url: &str) -> String {
        let url = url.trim();
        let mut hasher = Sha256::new();
        hasher.update(url.trim_end_matches('/').as_bytes());
        hex::encode(hasher.finalize())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Io(std::io::Error::other(e.to_string())))
    }

    /// Cached body for `url`, or None. Non-UTF-8 rows are treated as missing.
    pub fn get_body(&self, url: &str) -> Result<Option<CachedBody>, CacheError> {
        let key = Self::key_for(url);
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT body, fetched_utc FROM feed_bodies WHERE key = ?1")?;
        let row = stmt
            .query_row([&key], |r| Ok((r.get::<_, Vec<u8>>(0)?, r.get::<_, i64>(1)?)))
            .optional()?;
        Ok(row.and_then(|(raw, fetched_utc)| {
            String::from_utf8(raw)
                .ok()
                .map(|body| CachedBody { body, fetched_utc })
        }))
    }

    /// Store (replace) the body fetched from `url`.
    pub fn set_body(&self, url: &str, body: &str) -> Result<(), CacheError> {
        let key = Self::key_for(url);
        let fetched = time::OffsetDateTime::now_utc().unix_timestamp();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO feed_bodies (key, url, body, fetched_utc) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![key, url, body.as_bytes(), fetched],
        )?;
        Ok(())
    }
}
