//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Pagesift database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per distinct crawled URL
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    crawled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_crawled_at ON pages(crawled_at);

-- Crawl requests; rows are never deleted and serve as an audit trail
CREATE TABLE IF NOT EXISTS crawl_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_queue_status ON crawl_queue(status);
CREATE INDEX IF NOT EXISTS idx_crawl_queue_url ON crawl_queue(url);
"#;

/// Initializes the database schema
///
/// Safe to call on every startup; all statements are `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
