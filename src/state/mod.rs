//! State module for tracking crawl queue progress
//!
//! `QueueStatus` is the state machine every crawl request moves through.

mod queue_status;

pub use queue_status::QueueStatus;
