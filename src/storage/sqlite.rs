//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::QueueStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{format_timestamp, parse_timestamp, PageContent, PageRecord, QueueEntry};
use crate::SiftError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "id, url, title, description, keywords, content, crawled_at";
const QUEUE_COLUMNS: &str = "id, url, status, added_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SiftError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SiftError> {
        let conn = Connection::open(path)?;

        // WAL lets stats readers see batch progress while it is written
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SiftError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let crawled_at: Option<String> = row.get(6)?;
    Ok(PageRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        keywords: row.get(4)?,
        content: row.get(5)?,
        crawled_at: crawled_at.as_deref().and_then(parse_timestamp),
    })
}

fn queue_entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    let status: String = row.get(2)?;
    let added_at: String = row.get(3)?;
    Ok(QueueEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        status: QueueStatus::from_db_string(&status).unwrap_or(QueueStatus::Failed),
        added_at: parse_timestamp(&added_at).unwrap_or_default(),
    })
}

fn upsert_page_with(conn: &Connection, url: &str, content: &PageContent) -> StorageResult<i64> {
    let now = format_timestamp(Utc::now());
    conn.execute(
        "INSERT INTO pages (url, title, description, keywords, content, crawled_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(url) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             keywords = excluded.keywords,
             content = excluded.content,
             crawled_at = excluded.crawled_at",
        params![
            url,
            content.title,
            content.description,
            content.keywords,
            content.content,
            now
        ],
    )?;

    // last_insert_rowid is not updated on the conflict path
    let id = conn.query_row("SELECT id FROM pages WHERE url = ?1", params![url], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Reports why a guarded status update touched no rows
fn missing_or_stale(conn: &Connection, id: i64, expected: QueueStatus) -> StorageError {
    let exists = conn
        .query_row("SELECT 1 FROM crawl_queue WHERE id = ?1", params![id], |_| {
            Ok(())
        })
        .optional();

    match exists {
        Ok(Some(())) => StorageError::StaleStatus { id, expected },
        Ok(None) => StorageError::QueueEntryNotFound(id),
        Err(e) => StorageError::Sqlite(e),
    }
}

fn transition_with(
    conn: &Connection,
    id: i64,
    from: QueueStatus,
    to: QueueStatus,
) -> StorageResult<()> {
    if !from.can_transition_to(to) {
        return Err(StorageError::InvalidTransition { from, to });
    }

    let changed = conn.execute(
        "UPDATE crawl_queue SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to.to_db_string(), id, from.to_db_string()],
    )?;

    if changed == 0 {
        return Err(missing_or_stale(conn, id, from));
    }
    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Page Management =====

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn upsert_page(&mut self, url: &str, content: &PageContent) -> StorageResult<i64> {
        upsert_page_with(&self.conn, url, content)
    }

    fn list_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM pages ORDER BY id ASC", PAGE_COLUMNS))?;

        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn list_recent_pages(&self, limit: usize) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages ORDER BY crawled_at DESC, id DESC LIMIT ?1",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![limit as i64], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Queue Management =====

    fn insert_queue_entry(&mut self, url: &str) -> StorageResult<i64> {
        let now = format_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO crawl_queue (url, status, added_at) VALUES (?1, ?2, ?3)",
            params![url, QueueStatus::Pending.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_queue_entry(&self, id: i64) -> StorageResult<QueueEntry> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_queue WHERE id = ?1", QUEUE_COLUMNS),
                params![id],
                queue_entry_from_row,
            )
            .optional()?
            .ok_or(StorageError::QueueEntryNotFound(id))
    }

    fn find_active_queue_entry(&self, url: &str) -> StorageResult<Option<QueueEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_queue WHERE url = ?1 ORDER BY id ASC",
            QUEUE_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![url], queue_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries.into_iter().find(|entry| entry.status.is_active()))
    }

    fn get_queue_entries_by_status(
        &self,
        status: QueueStatus,
        limit: usize,
    ) -> StorageResult<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_queue WHERE status = ?1 ORDER BY id ASC LIMIT ?2",
            QUEUE_COLUMNS
        ))?;

        let entries = stmt
            .query_map(
                params![status.to_db_string(), limit as i64],
                queue_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn transition_queue_entry(
        &mut self,
        id: i64,
        from: QueueStatus,
        to: QueueStatus,
    ) -> StorageResult<()> {
        transition_with(&self.conn, id, from, to)
    }

    fn complete_queue_entry(
        &mut self,
        id: i64,
        url: &str,
        content: &PageContent,
    ) -> StorageResult<i64> {
        // Dropping the transaction without commit rolls both writes back
        let tx = self.conn.transaction()?;
        let page_id = upsert_page_with(&tx, url, content)?;
        transition_with(&tx, id, QueueStatus::Processing, QueueStatus::Completed)?;
        tx.commit()?;
        Ok(page_id)
    }

    fn release_queue_entry(&mut self, id: i64) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE crawl_queue SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                QueueStatus::Pending.to_db_string(),
                id,
                QueueStatus::Processing.to_db_string()
            ],
        )?;

        if changed == 0 {
            return Err(missing_or_stale(&self.conn, id, QueueStatus::Processing));
        }
        Ok(())
    }

    fn recover_interrupted_entries(&mut self) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE crawl_queue SET status = ?1 WHERE status = ?2",
            params![
                QueueStatus::Pending.to_db_string(),
                QueueStatus::Processing.to_db_string()
            ],
        )?;
        Ok(changed)
    }

    // ===== Statistics =====

    fn count_queue_by_status(&self, status: QueueStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_queue WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_queue_entries_for_url(&self, url: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_queue WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
