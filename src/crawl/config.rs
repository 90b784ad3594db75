//! # Crawl configuration
//!
//! Module dedicated to the crawl configuration.

use std::time::Duration;

/// The default number of pool workers.
pub const DEFAULT_WORKERS: usize = 8;

/// The default number of messages fetched per batch.
pub const DEFAULT_BATCH_SIZE: u32 = 200;

/// The default ceiling for the final pool drain.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// The mail store crawl configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrawlConfig {
    /// The number of workers fetching message batches in parallel.
    pub workers: usize,

    /// The number of messages fetched per batch. The last batch of a
    /// folder may be shorter.
    pub batch_size: u32,

    /// The ceiling for the final pool drain. Exceeding it is a fatal
    /// timeout, not a silent partial result.
    pub drain_timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
