use std::{result, time::Duration};

use thiserror::Error;

use crate::AnyBoxedError;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// Errors related to mail store crawling.
///
/// Per-folder and per-batch failures are recorded into the index
/// rather than thrown across the pool: the orchestrator raises at
/// most one of them to its caller, after the pool drained.
#[derive(Debug, Error)]
pub enum Error {
    /// The store root folder cannot be opened. Fatal, aborts before
    /// any crawling starts.
    #[error("cannot connect to store: cannot open root folder")]
    OpenRootFolderError(#[source] AnyBoxedError),

    /// A specific folder cannot be opened, listed or counted. The
    /// crawl continues elsewhere but the outcome is tainted.
    #[error("cannot access folder {1}")]
    AccessFolderError(#[source] AnyBoxedError, String),

    /// A batch fetch failed wholesale. The task stops, others
    /// continue, the outcome is tainted.
    #[error("cannot fetch messages {2}..={3} of folder {1}")]
    FetchMessageRangeError(#[source] AnyBoxedError, String, u32, u32),

    /// The pool did not drain within the configured ceiling. Fatal,
    /// reported distinctly from crawl failures.
    #[error("cannot drain crawl tasks within {0:?}")]
    CrawlTimedOutError(Duration),
}
