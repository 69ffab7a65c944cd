use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// On-disk store of fetched page bodies keyed by request path.
pub struct PageCache {
    conn: Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub items: usize,
    pub expired: usize,
}

impl PageCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cache dir {:?}", dir))?;
        }
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let cache = PageCache { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pages (
                key        TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Cached body for `key` if it is younger than `ttl`.
    pub fn get(&self, key: &str, ttl: Duration) -> Result<Option<String>> {
        self.get_at(key, ttl, Utc::now())
    }

    fn get_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Result<Option<String>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM pages WHERE key = ?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(body, fetched_at)| {
            let age = now.timestamp() - fetched_at;
            (age <= ttl.num_seconds()).then_some(body)
        }))
    }

    pub fn put(&self, key: &str, body: &str) -> Result<()> {
        self.put_at(key, body, Utc::now())
    }

    fn put_at(&self, key: &str, body: &str, now: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pages (key, body, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, fetched_at = excluded.fetched_at",
            params![key, body, now.timestamp()],
        )?;
        Ok(())
    }

    pub fn stats(&self, ttl: Duration) -> Result<CacheStats> {
        let cutoff = Utc::now().timestamp() - ttl.num_seconds();
        let (items, expired): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(fetched_at < ?1), 0) FROM pages",
            params![cutoff],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(CacheStats {
            items: items as usize,
            expired: expired as usize,
        })
    }
}
