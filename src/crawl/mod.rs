//! # Crawl
//!
//! Module dedicated to mail store crawling: one crawl discovers
//! every folder of a store by sequential recursive descent, while a
//! bounded worker pool fetches their message ranges in parallel.
//! Everything aggregates into a shared
//! [`StoreIndex`](crate::index::StoreIndex), which is the input of a
//! later diff/sync stage. The main structure of this module is the
//! [`CrawlBuilder`].

pub(crate) mod batch;
pub mod config;
mod error;
mod task;

use std::{fmt, future::Future, pin::Pin, sync::Arc};

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::{
    index::StoreIndex,
    store::{Folder, FolderSession, OpenMode, Store},
    thread_pool::ThreadPool,
    AnyResult,
};

use self::task::FolderCrawlTask;

#[doc(inline)]
pub use self::{
    config::CrawlConfig,
    error::{Error, Result},
};

/// The crawl async event handler.
pub type CrawlEventHandler =
    dyn Fn(CrawlEvent) -> Pin<Box<dyn Future<Output = AnyResult<()>> + Send>> + Send + Sync;

/// The crawl progress event.
///
/// Represents all the events that can be triggered while a store is
/// being crawled. Counters on the index move together with these.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum CrawlEvent {
    DiscoveredFolder(String),
    CountedFolderMessages(String, u32),
    DispatchedBatch(String, u32, u32),
    IndexedMessages(String, u64),
    SkippedMessages(String, u64),
}

impl CrawlEvent {
    pub(crate) async fn emit(&self, handler: &Option<Arc<CrawlEventHandler>>) {
        if let Some(handler) = handler.as_ref() {
            if let Err(err) = handler(self.clone()).await {
                debug!("error while emitting crawl event: {err}");
                trace!("{err:?}");
            } else {
                trace!("emitted crawl event {self:?}");
            }
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlEvent::DiscoveredFolder(folder) => {
                write!(f, "Discovered folder {folder}")
            }
            CrawlEvent::CountedFolderMessages(folder, n) => {
                write!(f, "Counted {n} messages in folder {folder}")
            }
            CrawlEvent::DispatchedBatch(folder, first, last) => {
                write!(f, "Dispatched batch {first}..={last} of folder {folder}")
            }
            CrawlEvent::IndexedMessages(folder, n) => {
                write!(f, "Indexed {n} messages from folder {folder}")
            }
            CrawlEvent::SkippedMessages(folder, n) => {
                write!(f, "Skipped {n} messages from folder {folder}")
            }
        }
    }
}

/// The context shared by the walker and every pool worker.
pub(crate) struct CrawlContext {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) index: Arc<StoreIndex>,
    pub(crate) handler: Option<Arc<CrawlEventHandler>>,
}

/// The crawl builder.
///
/// Drives one full crawl of a mail store: sets up the worker pool,
/// walks the folder tree, waits for the pool to drain and converts
/// aggregated failures into a single reported outcome. The caller
/// receives either a fully populated index or one descriptive
/// failure, never a half-populated index presented as success.
pub struct CrawlBuilder {
    store: Arc<dyn Store>,
    config: CrawlConfig,
    handler: Option<Arc<CrawlEventHandler>>,
}

impl CrawlBuilder {
    /// Create a new crawl builder using the given store handle.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            config: CrawlConfig::default(),
            handler: None,
        }
    }

    pub fn set_config(&mut self, config: CrawlConfig) {
        self.config = config;
    }

    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.set_config(config);
        self
    }

    pub fn set_some_handler<F: Future<Output = AnyResult<()>> + Send + 'static>(
        &mut self,
        handler: Option<impl Fn(CrawlEvent) -> F + Send + Sync + 'static>,
    ) {
        self.handler = match handler {
            Some(handler) => Some(Arc::new(move |evt| Box::pin(handler(evt)))),
            None => None,
        };
    }

    pub fn set_handler<F: Future<Output = AnyResult<()>> + Send + 'static>(
        &mut self,
        handler: impl Fn(CrawlEvent) -> F + Send + Sync + 'static,
    ) {
        self.set_some_handler(Some(handler));
    }

    pub fn with_some_handler<F: Future<Output = AnyResult<()>> + Send + 'static>(
        mut self,
        handler: Option<impl Fn(CrawlEvent) -> F + Send + Sync + 'static>,
    ) -> Self {
        self.set_some_handler(handler);
        self
    }

    pub fn with_handler<F: Future<Output = AnyResult<()>> + Send + 'static>(
        mut self,
        handler: impl Fn(CrawlEvent) -> F + Send + Sync + 'static,
    ) -> Self {
        self.set_handler(handler);
        self
    }

    /// Run the crawl.
    ///
    /// Opens the root folder, records the hierarchy separator, walks
    /// the folder tree dispatching fetch batches to the pool, then
    /// drains the pool and inspects the index: if any failure was
    /// recorded the first one is raised (a walk-level failure taking
    /// precedence over task-level ones), otherwise the populated
    /// index is returned.
    pub async fn crawl(self) -> Result<Arc<StoreIndex>> {
        let index = Arc::new(StoreIndex::new());

        debug!("opening store root folder…");
        let root = self
            .store
            .open_root_folder()
            .await
            .map_err(Error::OpenRootFolderError)?;

        // the separator must be known before any folder name reaches
        // consumers of the index
        index.set_folder_separator(root.separator());

        let ctx = Arc::new(CrawlContext {
            store: self.store.clone(),
            index: index.clone(),
            handler: self.handler.clone(),
        });
        let pool = ThreadPool::new(ctx.clone(), self.config.workers.max(1));

        crawl_folders(&ctx, &pool, self.config.batch_size, root.as_ref()).await;
        drop(ctx);

        debug!("walked the whole folder tree, draining the pool…");
        pool.close(self.config.drain_timeout).await?;

        match index.first_crawl_error() {
            Some(err) => Err(err),
            None => Ok(index),
        }
    }
}

/// Recursive, single-threaded descent of the folder hierarchy.
///
/// Each visited folder is recorded; message-holding folders get their
/// ranges partitioned into batches and dispatched to the pool without
/// waiting, then children are recursed into depth-first. A failure on
/// one folder taints the outcome but the walk continues into siblings.
fn crawl_folders<'a>(
    ctx: &'a Arc<CrawlContext>,
    pool: &'a ThreadPool<CrawlContext>,
    batch_size: u32,
    folder: &'a dyn Folder,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let full_name = folder.full_name().to_owned();

        ctx.index.add_folder(&full_name);
        CrawlEvent::DiscoveredFolder(full_name.clone())
            .emit(&ctx.handler)
            .await;

        if folder.kind().holds_messages() {
            match count_messages(folder).await {
                Ok(message_count) => {
                    CrawlEvent::CountedFolderMessages(full_name.clone(), message_count)
                        .emit(&ctx.handler)
                        .await;

                    for (first, last) in batch::batch_ranges(message_count, batch_size) {
                        trace!("dispatching batch {first}..={last} of folder {full_name}");
                        let task = FolderCrawlTask::new(&full_name, first, last);
                        pool.send(move |ctx| task.run(ctx));

                        CrawlEvent::DispatchedBatch(full_name.clone(), first, last)
                            .emit(&ctx.handler)
                            .await;
                    }
                }
                Err(err) => {
                    debug!("cannot count messages of folder {full_name}: {err}");
                    trace!("{err:?}");
                    ctx.index.record_walk_error(err);
                }
            }
        }

        if folder.kind().holds_folders() {
            match folder.list_child_folders().await {
                Ok(children) => {
                    for child in children {
                        crawl_folders(ctx, pool, batch_size, child.as_ref()).await;
                    }
                }
                Err(err) => {
                    debug!("cannot list children of folder {full_name}: {err}");
                    trace!("{err:?}");
                    ctx.index
                        .record_walk_error(Error::AccessFolderError(err, full_name.clone()));
                }
            }
        }
    })
}

/// Read the message count of a folder through a short-lived read-only
/// session.
///
/// A session that is not effectively read-only, or that carries
/// pending deletions, reports a stale count until expunged.
async fn count_messages(folder: &dyn Folder) -> Result<u32> {
    let full_name = folder.full_name();

    let mut session = folder
        .open_read_only()
        .await
        .map_err(|err| Error::AccessFolderError(err, full_name.to_owned()))?;

    let expunged = if session.mode() != OpenMode::ReadOnly || session.has_pending_deletions() {
        session.expunge().await
    } else {
        Ok(())
    };
    let message_count = expunged.map(|()| session.message_count());

    close_folder_session(session, full_name).await;

    message_count.map_err(|err| Error::AccessFolderError(err, full_name.to_owned()))
}

/// Close a folder session, absorbing the failure: the session is
/// released on every exit path, and a close hiccup is not worth
/// tainting the crawl.
pub(crate) async fn close_folder_session(session: Box<dyn FolderSession>, folder: &str) {
    if let Err(err) = session.close().await {
        debug!("cannot close folder {folder}: {err}");
        trace!("{err:?}");
    }
}
