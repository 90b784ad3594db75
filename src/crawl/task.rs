//! # Folder crawl task
//!
//! Module dedicated to the unit of crawl work: fetch one contiguous
//! message range from one folder and feed the identities into the
//! shared index.

use std::sync::{Arc, PoisonError};

use tracing::{debug, trace};

use crate::envelope::MessageIdentity;

use super::{close_folder_session, CrawlContext, CrawlEvent, Error};

/// A unit of crawl work over one message range of one folder.
pub(crate) struct FolderCrawlTask {
    folder: String,
    first: u32,
    last: u32,
}

impl FolderCrawlTask {
    pub(crate) fn new(folder: impl ToString, first: u32, last: u32) -> Self {
        Self {
            folder: folder.to_string(),
            first,
            last,
        }
    }

    /// Execute the task.
    ///
    /// Errors never escape the task: wholesale open/fetch failures
    /// are recorded into the index, unreadable messages are counted
    /// as skipped.
    pub(crate) async fn run(self, ctx: Arc<CrawlContext>) {
        if ctx.index.has_crawl_error() {
            // the crawl is already tainted, stop producing work
            trace!(
                "skipping batch {}..={} of folder {}: crawl already failed",
                self.first,
                self.last,
                self.folder
            );
            return;
        }

        if let Err(err) = self.fetch(&ctx).await {
            debug!("cannot crawl folder {}: {err}", self.folder);
            trace!("{err:?}");
            ctx.index.record_task_error(err);
        }
    }

    async fn fetch(&self, ctx: &CrawlContext) -> Result<(), Error> {
        let folder = ctx
            .store
            .open_folder(&self.folder)
            .await
            .map_err(|err| Error::AccessFolderError(err, self.folder.clone()))?;

        let mut session = folder
            .open_read_only()
            .await
            .map_err(|err| Error::AccessFolderError(err, self.folder.clone()))?;

        let envelopes = match session.fetch_range(self.first, self.last).await {
            Ok(envelopes) => envelopes,
            Err(err) => {
                close_folder_session(session, &self.folder).await;
                return Err(Error::FetchMessageRangeError(
                    err,
                    self.folder.clone(),
                    self.first,
                    self.last,
                ));
            }
        };

        let messages = ctx.index.folder_messages(&self.folder);
        let mut indexed = 0u64;
        let mut skipped = 0u64;

        for envelope in envelopes {
            match MessageIdentity::try_from_envelope(&envelope) {
                Ok(identity) => {
                    messages
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(identity);
                    indexed += 1;
                }
                Err(err) => {
                    debug!("skipping message {} of folder {}: {err}", envelope.number, self.folder);
                    skipped += 1;
                }
            }
        }

        ctx.index.add_indexed_message_count(indexed);
        ctx.index.add_skipped_message_count(skipped);

        CrawlEvent::IndexedMessages(self.folder.clone(), indexed)
            .emit(&ctx.handler)
            .await;
        if skipped > 0 {
            CrawlEvent::SkippedMessages(self.folder.clone(), skipped)
                .emit(&ctx.handler)
                .await;
        }

        close_folder_session(session, &self.folder).await;

        Ok(())
    }
}
