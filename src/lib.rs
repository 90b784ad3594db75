//! Rust library to index the contents of a remote mail store.
//!
//! The main purpose of this library is to build an in-memory,
//! concurrency-safe [`StoreIndex`] of every folder and message
//! identity present in a mail store: the folder tree is discovered
//! by a single sequential walk while message ranges are fetched in
//! parallel by a bounded worker pool. The populated index is a
//! transient, process-lifetime snapshot meant to be compared against
//! the index of another store by a later diff/sync stage, which is
//! out of scope here.
//!
//! The store itself is abstract: this library never speaks a
//! protocol and never mutates the remote store. Implement the
//! [`store::Store`], [`store::Folder`] and [`store::FolderSession`]
//! traits for your mail backend, then drive a crawl through the
//! [`CrawlBuilder`]:
//!
//! ```ignore
//! let store: Arc<dyn Store> = open_my_store().await?;
//! let index = CrawlBuilder::new(store)
//!     .with_config(CrawlConfig::default())
//!     .crawl()
//!     .await?;
//! ```

pub mod crawl;
pub mod envelope;
mod error;
pub mod index;
pub mod store;
mod thread_pool;

#[doc(inline)]
pub use crate::{
    crawl::{CrawlBuilder, CrawlConfig, CrawlEvent, CrawlEventHandler},
    envelope::{Envelope, Mailbox, MessageIdentity},
    error::{AnyBoxedError, AnyError, AnyResult},
    index::StoreIndex,
};
