//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Page upserts keyed by URL
//! - Crawl queue entries and their status transitions
//! - Counts used by the statistics endpoint

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::QueueStatus;
use crate::{Result, SiftError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the coordinator and the HTTP handlers
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SiftError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps opened storage for sharing
pub fn share(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage, reporting a poisoned lock as a storage error
pub fn lock(storage: &SharedStorage) -> Result<MutexGuard<'_, SqliteStorage>> {
    storage
        .lock()
        .map_err(|_| SiftError::Storage("storage lock poisoned".to_string()))
}

/// Extracted fields written to a page on every successful crawl
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageContent {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub content: String,
}

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub content: String,
    pub crawled_at: Option<DateTime<Utc>>,
}

/// Represents a crawl queue entry in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub id: i64,
    pub url: String,
    pub status: QueueStatus,
    pub added_at: DateTime<Utc>,
}

/// Formats a timestamp for storage
///
/// Fixed-width microsecond precision keeps the text column sortable.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp, ignoring values that are not RFC 3339
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
