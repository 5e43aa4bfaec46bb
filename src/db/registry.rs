use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::Feed;

use super::schema::SCHEMA;

/// Persisted feed registry: the feeds table plus the per-feed seen-set.
///
/// All operations funnel through one background connection, so they execute
/// serially; the worker and the command handlers can hold clones of this
/// handle without ever observing a half-applied operation.
#[derive(Clone)]
pub struct FeedRegistry {
    conn: Connection,
}

impl FeedRegistry {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            // Cascading deletes from feeds into seen_entries need this.
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Adds a feed, failing with `DuplicateFeed` if the URL is registered.
    pub async fn add_feed(&self, url: &str) -> Result<i64> {
        let url = url.trim().to_string();
        let reported_url = url.clone();

        let id = self
            .conn
            .call(move |conn| {
                match conn.execute("INSERT INTO feeds (url, paused) VALUES (?1, 0)", params![url])
                {
                    Ok(_) => Ok(Some(conn.last_insert_rowid())),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Ok(None)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        id.ok_or(AppError::DuplicateFeed(reported_url))
    }

    /// Adds a feed if the URL is absent. Returns whether a row was created.
    /// An existing feed is left exactly as it was, paused or not.
    pub async fn ensure_seeded(&self, url: &str) -> Result<bool> {
        let url = url.trim().to_string();
        let created = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO feeds (url, paused) VALUES (?1, 0)",
                    params![url],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(created)
    }

    /// Deletes a feed and (via cascade) its seen-set. False if id unknown.
    pub async fn remove_feed(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM feeds WHERE id = ?1", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        Ok(removed)
    }

    pub async fn set_paused(&self, id: i64, paused: bool) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE feeds SET paused = ?1 WHERE id = ?2",
                    params![paused, id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(changed)
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, paused, created_at FROM feeds ORDER BY id ASC",
                )?;
                let feeds = stmt
                    .query_map([], |row| Ok(feed_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    pub async fn active_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, paused, created_at FROM feeds WHERE paused = 0 ORDER BY id ASC",
                )?;
                let feeds = stmt
                    .query_map([], |row| Ok(feed_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    pub async fn find_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let url = url.trim().to_string();
        let feed = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, paused, created_at FROM feeds WHERE url = ?1",
                )?;
                let feed = stmt
                    .query_row(params![url], |row| Ok(feed_from_row(row)))
                    .optional()?;
                Ok(feed)
            })
            .await?;
        Ok(feed)
    }

    pub async fn has_seen(&self, feed_id: i64, entry_uid: &str) -> Result<bool> {
        let entry_uid = entry_uid.to_string();
        let seen = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM seen_entries WHERE feed_id = ?1 AND entry_uid = ?2",
                    params![feed_id, entry_uid],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(seen)
    }

    /// Records an entry as delivered (or judged not retry-worthy).
    /// Idempotent: re-marking the same (feed, uid) pair is a no-op.
    pub async fn mark_seen(&self, feed_id: i64, entry_uid: &str) -> Result<()> {
        let entry_uid = entry_uid.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO seen_entries (feed_id, entry_uid) VALUES (?1, ?2)",
                    params![feed_id, entry_uid],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn seen_count(&self, feed_id: i64) -> Result<i64> {
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM seen_entries WHERE feed_id = ?1",
                    params![feed_id],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn feed_from_row(row: &Row) -> Feed {
    Feed {
        id: row.get(0).unwrap(),
        url: row.get(1).unwrap(),
        paused: row.get::<_, i64>(2).unwrap() != 0,
        created_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}
