//! # Thread pool
//!
//! Module dedicated to the bounded worker pool executing crawl
//! tasks. The pool is fed through a channel: tasks are submitted
//! without waiting for their completion, then the pool is drained
//! once the walker stops producing work. A task is a function that
//! takes the shared crawl context and returns a future; task
//! outcomes never cross the pool boundary, they land in the shared
//! index.

use std::{pin::Pin, sync::Arc, time::Duration};

use futures::{lock::Mutex, Future};
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{debug, trace, warn};

use crate::crawl;

/// The pool task.
pub(crate) type Task<C> =
    Box<dyn FnOnce(Arc<C>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The bounded worker pool.
pub(crate) struct ThreadPool<C> {
    /// Channel used to send tasks to workers.
    tx: mpsc::UnboundedSender<Task<C>>,

    /// The list of workers spawned by the pool.
    workers: Vec<JoinHandle<()>>,
}

impl<C: Send + Sync + 'static> ThreadPool<C> {
    /// Spawn a pool of `size` workers sharing the given context.
    pub(crate) fn new(ctx: Arc<C>, size: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Task<C>>();
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = Vec::with_capacity(size);

        for id in 1..=size {
            let ctx = ctx.clone();
            let rx = rx.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    let mut lock = rx.lock().await;

                    trace!("worker {id} waiting for a task…");
                    match lock.recv().await {
                        None => {
                            drop(lock);
                            break;
                        }
                        Some(task) => {
                            drop(lock);

                            trace!("worker {id} received a task, executing it…");
                            task(ctx.clone()).await;
                        }
                    }
                }

                debug!("no more task for worker {id}, exiting");
            }));
        }

        Self { tx, workers }
    }

    /// Submit a task to the pool without waiting for its completion.
    pub(crate) fn send<F>(&self, task: impl FnOnce(Arc<C>) -> F + Send + Sync + 'static)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task: Task<C> = Box::new(move |ctx| Box::pin(task(ctx)));
        if self.tx.send(task).is_err() {
            warn!("cannot submit task: pool is closed");
        }
    }

    /// Stop accepting new tasks, then wait for every submitted task
    /// to complete, up to the given ceiling.
    ///
    /// Exceeding the ceiling aborts the remaining workers and fails
    /// with a fatal timeout: a crawl that does not drain cannot be
    /// reported as a partial success.
    pub(crate) async fn close(self, timeout: Duration) -> crawl::Result<()> {
        drop(self.tx);

        let aborts: Vec<_> = self.workers.iter().map(JoinHandle::abort_handle).collect();

        let drain = async {
            for (id, worker) in self.workers.into_iter().enumerate() {
                if let Err(err) = worker.await {
                    warn!("cannot join worker {}: {err}", id + 1);
                }
            }
        };

        match time::timeout(timeout, drain).await {
            Ok(()) => Ok(()),
            Err(_) => {
                for abort in aborts {
                    abort.abort();
                }
                Err(crawl::Error::CrawlTimedOutError(timeout))
            }
        }
    }
}
