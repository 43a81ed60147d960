//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::QueueStatus;
use crate::storage::{PageContent, PageRecord, QueueEntry};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Queue entry not found: {0}")]
    QueueEntryNotFound(i64),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },

    #[error("Queue entry {id} is not in status {expected}")]
    StaleStatus { id: i64, expected: QueueStatus },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every mutating call is committed before it returns, so other readers
/// (stats pollers, the search path) observe crawl progress live.
pub trait Storage {
    // ===== Page Management =====

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Inserts a page or overwrites the existing page with the same URL
    ///
    /// The crawl timestamp is set to the current time in both cases.
    ///
    /// # Returns
    ///
    /// The page ID (unchanged when an existing page is updated)
    fn upsert_page(&mut self, url: &str, content: &PageContent) -> StorageResult<i64>;

    /// Lists every stored page in insertion order
    fn list_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Lists the most recently crawled pages, newest first
    fn list_recent_pages(&self, limit: usize) -> StorageResult<Vec<PageRecord>>;

    /// Gets total page count
    fn count_pages(&self) -> StorageResult<u64>;

    // ===== Queue Management =====

    /// Inserts a new `pending` queue entry
    ///
    /// # Returns
    ///
    /// The ID of the new entry
    fn insert_queue_entry(&mut self, url: &str) -> StorageResult<i64>;

    /// Gets a queue entry by ID
    fn get_queue_entry(&self, id: i64) -> StorageResult<QueueEntry>;

    /// Finds a `pending` or `processing` entry for the URL, if any
    fn find_active_queue_entry(&self, url: &str) -> StorageResult<Option<QueueEntry>>;

    /// Gets up to `limit` entries with the given status in insertion order
    fn get_queue_entries_by_status(
        &self,
        status: QueueStatus,
        limit: usize,
    ) -> StorageResult<Vec<QueueEntry>>;

    /// Moves an entry from `from` to `to`
    ///
    /// Fails with `InvalidTransition` if the state machine forbids the move
    /// and with `StaleStatus` if the entry is no longer in `from`.
    fn transition_queue_entry(
        &mut self,
        id: i64,
        from: QueueStatus,
        to: QueueStatus,
    ) -> StorageResult<()>;

    /// Upserts the page and marks the entry `completed` in one transaction
    ///
    /// # Returns
    ///
    /// The page ID
    fn complete_queue_entry(
        &mut self,
        id: i64,
        url: &str,
        content: &PageContent,
    ) -> StorageResult<i64>;

    /// Returns a `processing` entry to `pending`
    ///
    /// This is the rollback path for a batch that stopped on a storage
    /// failure; it is not a state-machine transition.
    fn release_queue_entry(&mut self, id: i64) -> StorageResult<()>;

    /// Returns every `processing` entry to `pending`
    ///
    /// Run once at startup to recover entries claimed by an interrupted process.
    ///
    /// # Returns
    ///
    /// The number of recovered entries
    fn recover_interrupted_entries(&mut self) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Counts queue entries by status
    fn count_queue_by_status(&self, status: QueueStatus) -> StorageResult<u64>;

    /// Counts all queue entries ever recorded for the URL
    fn count_queue_entries_for_url(&self, url: &str) -> StorageResult<u64>;
}
