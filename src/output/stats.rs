//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! index and crawl queue statistics from the storage layer.

use crate::state::QueueStatus;
use crate::storage::Storage;
use crate::Result;
use serde::Serialize;

/// Index and crawl queue counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStatistics {
    /// Total number of stored pages
    pub total_indexed_pages: u64,

    /// Queue entries waiting for a batch
    pub pending_crawls: u64,

    /// Queue entries claimed by a running batch
    pub processing_crawls: u64,

    /// Queue entries that finished successfully
    pub completed_crawls: u64,

    /// Queue entries whose fetch failed
    pub failed_crawls: u64,
}

impl IndexStatistics {
    /// Total number of queue entries ever recorded
    pub fn total_crawls(&self) -> u64 {
        self.pending_crawls + self.processing_crawls + self.completed_crawls + self.failed_crawls
    }

    fn count_for(&mut self, status: QueueStatus) -> &mut u64 {
        match status {
            QueueStatus::Pending => &mut self.pending_crawls,
            QueueStatus::Processing => &mut self.processing_crawls,
            QueueStatus::Completed => &mut self.completed_crawls,
            QueueStatus::Failed => &mut self.failed_crawls,
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(IndexStatistics)` - Successfully loaded statistics
/// * `Err(SiftError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<IndexStatistics> {
    let mut stats = IndexStatistics {
        total_indexed_pages: storage.count_pages()?,
        ..Default::default()
    };

    for status in QueueStatus::all_statuses() {
        *stats.count_for(status) = storage.count_queue_by_status(status)?;
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Total indexed pages: {}", stats.total_indexed_pages);
    println!("  Total crawl requests: {}", stats.total_crawls());
    println!();

    println!("Crawl Queue:");
    let total = stats.total_crawls();
    for (status, count) in [
        (QueueStatus::Pending, stats.pending_crawls),
        (QueueStatus::Processing, stats.processing_crawls),
        (QueueStatus::Completed, stats.completed_crawls),
        (QueueStatus::Failed, stats.failed_crawls),
    ] {
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    let finished = stats.completed_crawls + stats.failed_crawls;
    let success_rate = if finished > 0 {
        (stats.completed_crawls as f64 / finished as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} finished requests completed)",
        success_rate, stats.completed_crawls, finished
    );
}
