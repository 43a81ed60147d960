//! Crawler coordinator - crawl queue orchestration
//!
//! This module owns the crawl queue state machine:
//! - Validating and enqueueing crawl requests
//! - Claiming pending entries in batches
//! - Driving fetch and extraction for each entry
//! - Recording terminal status and pacing requests with a fixed delay

use crate::config::{Config, DedupMode};
use crate::crawler::extractor::extract_page;
use crate::crawler::{build_http_client, fetch_url, FetchResult};
use crate::state::QueueStatus;
use crate::storage::{self, QueueEntry, SharedStorage, SqliteStorage, Storage, StorageError};
use crate::url::validate_crawl_url;
use crate::{Result, SiftError};
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;

/// Outcome of an enqueue request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// The normalized URL that was queued
    pub url: String,
    /// ID of the new or already active queue entry
    pub entry_id: i64,
    /// False when an active entry for the URL already existed
    pub created: bool,
}

/// Counts reported by one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Entries that reached a terminal status
    pub processed: usize,
    /// Entries that reached `completed`
    pub completed: usize,
    /// Entries that reached `failed`
    pub failed: usize,
    /// Completed entries whose URL was already crawled, so no fetch was made
    pub already_crawled: usize,
}

/// How a single claimed entry finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Indexed,
    AlreadyCrawled,
    Failed,
}

impl EntryOutcome {
    fn status(self) -> QueueStatus {
        match self {
            Self::Indexed | Self::AlreadyCrawled => QueueStatus::Completed,
            Self::Failed => QueueStatus::Failed,
        }
    }
}

impl BatchReport {
    fn record(&mut self, outcome: EntryOutcome) {
        self.processed += 1;
        match outcome {
            EntryOutcome::Indexed => self.completed += 1,
            EntryOutcome::AlreadyCrawled => {
                self.completed += 1;
                self.already_crawled += 1;
            }
            EntryOutcome::Failed => self.failed += 1,
        }
    }
}

/// Validates a URL and adds it to the crawl queue
///
/// Idempotent while the URL is queued: if a `pending` or `processing`
/// entry already exists, nothing is written and that entry is reported.
/// Once an entry is terminal, enqueueing the URL again creates a fresh entry.
///
/// # Returns
///
/// * `Ok(EnqueueOutcome)` - URL is queued
/// * `Err(SiftError::UrlError)` - URL is not an absolute http(s) URL
/// * `Err(SiftError)` - Storage failure
pub fn enqueue(storage: &mut dyn Storage, raw_url: &str) -> Result<EnqueueOutcome> {
    let url = validate_crawl_url(raw_url)?.to_string();

    if let Some(existing) = storage.find_active_queue_entry(&url)? {
        tracing::debug!("{} already queued as entry {}", url, existing.id);
        return Ok(EnqueueOutcome {
            url,
            entry_id: existing.id,
            created: false,
        });
    }

    let entry_id = storage.insert_queue_entry(&url)?;
    tracing::info!("Queued {} as entry {}", url, entry_id);

    Ok(EnqueueOutcome {
        url,
        entry_id,
        created: true,
    })
}

/// Enqueues every seed URL, returning how many new entries were created
pub fn seed_queue(storage: &mut dyn Storage, seeds: &[String]) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        if enqueue(storage, seed)?.created {
            created += 1;
        }
    }
    tracing::info!("Seeded crawl queue: {} of {} URLs added", created, seeds.len());
    Ok(created)
}

/// Startup phase run once before crawling or serving
///
/// Entries left in `processing` by an interrupted process are returned to
/// `pending` so a later batch picks them up again.
pub fn initialize(storage: &mut dyn Storage) -> Result<usize> {
    let recovered = storage.recover_interrupted_entries()?;
    if recovered > 0 {
        tracing::info!("Recovered {} interrupted queue entries", recovered);
    }
    Ok(recovered)
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: SharedStorage,
    client: Client,
    /// URLs successfully crawled by this coordinator since it was created
    crawled_urls: HashSet<String>,
}

impl Coordinator {
    /// Creates a coordinator over already-initialized storage
    pub fn new(config: Config, storage: SharedStorage) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;

        Ok(Self {
            config: Arc::new(config),
            storage,
            client,
            crawled_urls: HashSet::new(),
        })
    }

    /// Opens the configured database, runs the startup phase, and builds a coordinator
    pub fn open(config: Config) -> Result<Self> {
        let mut storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
        initialize(&mut storage)?;
        Self::new(config, storage::share(storage))
    }

    /// Returns a handle to the coordinator's storage
    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Returns the coordinator's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates a URL and adds it to the crawl queue
    pub fn enqueue(&self, raw_url: &str) -> Result<EnqueueOutcome> {
        let mut storage = self.lock_storage()?;
        enqueue(&mut *storage, raw_url)
    }

    /// Runs one crawl batch
    ///
    /// Claims up to `batch_size` pending entries in insertion order and
    /// processes them one at a time:
    ///
    /// 1. `pending -> processing`, committed before any network I/O
    /// 2. Already-crawled URLs are completed without a fetch
    /// 3. Otherwise GET with the configured timeout
    /// 4. Success: extract, upsert the page, and complete in one transaction
    /// 5. Any fetch failure: `processing -> failed`, no retry
    /// 6. Sleep the fixed request delay, whatever the outcome
    ///
    /// Fetch failures never abort the batch. A storage failure stops the
    /// batch: the in-flight entry is released back to `pending` and the
    /// error is returned.
    pub async fn run_batch(&mut self) -> Result<BatchReport> {
        let batch_size = self.config.crawler.batch_size as usize;
        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);

        let entries = {
            let storage = self.lock_storage()?;
            storage.get_queue_entries_by_status(QueueStatus::Pending, batch_size)?
        };

        tracing::info!("Starting crawl batch with {} pending entries", entries.len());

        let mut report = BatchReport::default();

        for entry in entries {
            match self.claim(&entry) {
                Ok(()) => {}
                Err(SiftError::StorageError(StorageError::StaleStatus { .. })) => {
                    tracing::warn!("Entry {} was claimed elsewhere, skipping", entry.id);
                    continue;
                }
                Err(e) => return Err(e),
            }

            match self.process_entry(&entry).await {
                Ok(outcome) => {
                    tracing::debug!("Entry {} ({}) -> {}", entry.id, entry.url, outcome.status());
                    report.record(outcome);
                }
                Err(e) => {
                    tracing::error!("Storage failure while crawling {}: {}", entry.url, e);
                    self.release(&entry);
                    return Err(e);
                }
            }

            tokio::time::sleep(delay).await;
        }

        if let Err(e) = self.warn_if_over_soft_cap() {
            tracing::warn!("Could not check the page cap: {}", e);
        }

        tracing::info!(
            "Crawl batch finished: {} processed, {} completed, {} failed",
            report.processed,
            report.completed,
            report.failed
        );

        Ok(report)
    }

    /// Number of URLs this coordinator has crawled since it was created
    pub fn crawled_count(&self) -> usize {
        self.crawled_urls.len()
    }

    fn claim(&self, entry: &QueueEntry) -> Result<()> {
        let mut storage = self.lock_storage()?;
        storage.transition_queue_entry(entry.id, QueueStatus::Pending, QueueStatus::Processing)?;
        Ok(())
    }

    /// Drives one claimed entry to a terminal status
    ///
    /// Returns `Err` only for storage failures.
    async fn process_entry(&mut self, entry: &QueueEntry) -> Result<EntryOutcome> {
        if self.already_crawled(&entry.url)? {
            tracing::info!("{} already crawled, completing without fetch", entry.url);
            self.finish(entry, QueueStatus::Completed)?;
            return Ok(EntryOutcome::AlreadyCrawled);
        }

        let fetch_result = fetch_url(&self.client, &entry.url).await;

        match fetch_result {
            FetchResult::Success { final_url, body } => {
                if final_url != entry.url {
                    tracing::debug!("{} redirected to {}", entry.url, final_url);
                }

                let page = extract_page(&entry.url, &body);
                let page_id = {
                    let mut storage = self.lock_storage()?;
                    storage.complete_queue_entry(entry.id, &entry.url, &page)?
                };

                self.crawled_urls.insert(entry.url.clone());
                tracing::info!("Indexed {} as page {}", entry.url, page_id);
                Ok(EntryOutcome::Indexed)
            }
            failure => {
                let reason = failure.failure_reason().unwrap_or_default();
                tracing::warn!("Failed to crawl {}: {}", entry.url, reason);
                self.finish(entry, QueueStatus::Failed)?;
                Ok(EntryOutcome::Failed)
            }
        }
    }

    fn already_crawled(&self, url: &str) -> Result<bool> {
        match self.config.crawler.dedup {
            DedupMode::Process => Ok(self.crawled_urls.contains(url)),
            DedupMode::Store => {
                let storage = self.lock_storage()?;
                Ok(storage.get_page_by_url(url)?.is_some())
            }
        }
    }

    fn finish(&self, entry: &QueueEntry, status: QueueStatus) -> Result<()> {
        let mut storage = self.lock_storage()?;
        storage.transition_queue_entry(entry.id, QueueStatus::Processing, status)?;
        Ok(())
    }

    /// Best-effort rollback of a claimed entry after a storage failure
    fn release(&self, entry: &QueueEntry) {
        let released = self
            .lock_storage()
            .and_then(|mut storage| {
                storage
                    .release_queue_entry(entry.id)
                    .map_err(SiftError::from)
            });

        if let Err(e) = released {
            tracing::error!("Could not release entry {}: {}", entry.id, e);
        }
    }

    /// The page cap is advisory; crossing it is only reported
    fn warn_if_over_soft_cap(&self) -> Result<()> {
        let total = self.lock_storage()?.count_pages()?;
        if total > self.config.crawler.max_pages {
            tracing::warn!(
                "Index holds {} pages, above the configured max-pages of {}",
                total,
                self.config.crawler.max_pages
            );
        }
        Ok(())
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, SqliteStorage>> {
        storage::lock(&self.storage)
    }
}
