//! # Store index
//!
//! Module dedicated to the shared, concurrency-safe index populated
//! by one crawl of a mail store. The [`StoreIndex`] is the only
//! mutable state shared between the walking thread and the pool
//! workers: every mutation goes through its own thread-safe
//! operations.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use once_cell::sync::OnceCell;

use crate::{crawl, envelope::MessageIdentity, store::INBOX};

/// The set of message identities of one folder, shared between the
/// workers crawling its batches.
pub type FolderMessages = Arc<Mutex<HashSet<MessageIdentity>>>;

/// The in-memory index of every folder and message identity of a
/// mail store.
///
/// Populated by one crawl, then handed off read-only to callers. A
/// non-empty failure list means the index must not be trusted,
/// regardless of how much data was collected: the orchestrator never
/// returns such an index as success.
#[derive(Debug, Default)]
pub struct StoreIndex {
    /// The hierarchy separator of the store, written exactly once
    /// before any folder recursion.
    folder_separator: OnceCell<char>,

    /// The full name of the inbox folder, as first discovered.
    inbox: OnceCell<String>,

    /// The set of discovered folder full names.
    folders: Mutex<HashSet<String>>,

    /// The per-folder message identity sets, created lazily on first
    /// access and never replaced afterwards.
    folder_messages: Mutex<HashMap<String, FolderMessages>>,

    indexed_message_count: AtomicU64,
    skipped_message_count: AtomicU64,

    // Walk and task failures are kept apart: the orchestrator reports
    // the first walk failure over any task failure.
    walk_errors: Mutex<Vec<crawl::Error>>,
    task_errors: Mutex<Vec<crawl::Error>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StoreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_folder_separator(&self, separator: char) {
        let _ = self.folder_separator.set(separator);
    }

    /// The hierarchy separator of the crawled store.
    ///
    /// Available as soon as the root folder has been opened, before
    /// any folder name reaches the index.
    pub fn folder_separator(&self) -> Option<char> {
        self.folder_separator.get().copied()
    }

    /// The full name of the inbox folder, if one was discovered.
    pub fn inbox(&self) -> Option<&str> {
        self.inbox.get().map(String::as_str)
    }

    /// Record a discovered folder.
    ///
    /// Idempotent and safe from any thread. The first recorded folder
    /// whose name matches the well-known inbox name
    /// (case-insensitively) becomes the inbox; later case variants
    /// are ignored.
    pub fn add_folder(&self, full_name: impl ToString) {
        let full_name = full_name.to_string();
        if full_name.eq_ignore_ascii_case(INBOX) {
            let _ = self.inbox.set(full_name.clone());
        }
        lock(&self.folders).insert(full_name);
    }

    /// Return `true` if the given folder has been recorded.
    pub fn contains_folder(&self, full_name: impl AsRef<str>) -> bool {
        lock(&self.folders).contains(full_name.as_ref())
    }

    /// The set of discovered folder full names, as a snapshot.
    pub fn folders(&self) -> HashSet<String> {
        lock(&self.folders).clone()
    }

    /// The message identity set of the given folder.
    ///
    /// The set is created lazily on first access: concurrent callers
    /// asking for the same folder observe and mutate the same shared
    /// instance.
    pub fn folder_messages(&self, folder: impl AsRef<str>) -> FolderMessages {
        lock(&self.folder_messages)
            .entry(folder.as_ref().to_owned())
            .or_default()
            .clone()
    }

    pub(crate) fn add_indexed_message_count(&self, delta: u64) {
        self.indexed_message_count.fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn add_skipped_message_count(&self, delta: u64) {
        self.skipped_message_count.fetch_add(delta, Ordering::Relaxed);
    }

    /// The number of messages indexed so far, across all folders.
    pub fn indexed_message_count(&self) -> u64 {
        self.indexed_message_count.load(Ordering::Relaxed)
    }

    /// The number of messages skipped so far, across all folders.
    pub fn skipped_message_count(&self) -> u64 {
        self.skipped_message_count.load(Ordering::Relaxed)
    }

    pub(crate) fn record_walk_error(&self, err: crawl::Error) {
        lock(&self.walk_errors).push(err);
    }

    pub(crate) fn record_task_error(&self, err: crawl::Error) {
        lock(&self.task_errors).push(err);
    }

    /// Return `true` if any failure was recorded by the walker or by
    /// a worker.
    ///
    /// Cheap enough to poll: workers check it before picking up new
    /// work, so a tainted crawl stops producing as soon as practical.
    pub fn has_crawl_error(&self) -> bool {
        !lock(&self.walk_errors).is_empty() || !lock(&self.task_errors).is_empty()
    }

    /// Take the failure the whole crawl reports: the first recorded
    /// walk failure if any, the first recorded task failure
    /// otherwise.
    pub(crate) fn first_crawl_error(&self) -> Option<crawl::Error> {
        let mut walk_errors = lock(&self.walk_errors);
        if !walk_errors.is_empty() {
            return Some(walk_errors.remove(0));
        }
        drop(walk_errors);

        let mut task_errors = lock(&self.task_errors);
        if task_errors.is_empty() {
            None
        } else {
            Some(task_errors.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;
    use crate::envelope::{Envelope, Mailbox};

    fn identity(message_id: &str) -> MessageIdentity {
        MessageIdentity::try_from_envelope(&Envelope {
            number: 1,
            message_id: Some(message_id.into()),
            from: vec![Mailbox::new_nameless("alice@localhost")],
            to: vec![Mailbox::new_nameless("bob@localhost")],
            subject: Some("A".into()),
        })
        .unwrap()
    }

    #[test]
    fn add_folder_is_idempotent() {
        let index = StoreIndex::new();

        index.add_folder("Sent");
        index.add_folder("Sent");

        assert!(index.contains_folder("Sent"));
        assert!(!index.contains_folder("Trash"));
        assert_eq!(index.folders().len(), 1);
    }

    #[test]
    fn first_inbox_case_variant_wins() {
        let index = StoreIndex::new();

        index.add_folder("INBOX");
        index.add_folder("Inbox");

        assert_eq!(index.inbox(), Some("INBOX"));
        assert!(index.contains_folder("INBOX"));
        assert!(index.contains_folder("Inbox"));
    }

    #[test]
    fn folder_separator_is_write_once() {
        let index = StoreIndex::new();

        assert_eq!(index.folder_separator(), None);
        index.set_folder_separator('/');
        index.set_folder_separator('.');
        assert_eq!(index.folder_separator(), Some('/'));
    }

    #[test]
    fn folder_messages_returns_the_same_set_instance() {
        let index = StoreIndex::new();

        let left = index.folder_messages("INBOX");
        let right = index.folder_messages("INBOX");
        let other = index.folder_messages("Sent");

        assert!(Arc::ptr_eq(&left, &right));
        assert!(!Arc::ptr_eq(&left, &other));
    }

    #[test]
    fn concurrent_first_access_creates_one_set() {
        let index = Arc::new(StoreIndex::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let index = index.clone();
                thread::spawn(move || {
                    let messages = index.folder_messages("INBOX");
                    for n in 0..100 {
                        let id = format!("<{}@worker{worker}>", n);
                        messages.lock().unwrap().insert(identity(&id));
                    }
                    messages
                })
            })
            .collect();

        let sets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for set in &sets[1..] {
            assert!(Arc::ptr_eq(&sets[0], set));
        }
        assert_eq!(sets[0].lock().unwrap().len(), 800);
    }

    #[test]
    fn counters_accumulate_from_many_threads() {
        let index = Arc::new(StoreIndex::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        index.add_indexed_message_count(2);
                        index.add_skipped_message_count(1);
                        thread::sleep(Duration::from_micros(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.indexed_message_count(), 400);
        assert_eq!(index.skipped_message_count(), 200);
    }

    #[test]
    fn walk_error_wins_over_earlier_task_error() {
        let index = StoreIndex::new();
        assert!(!index.has_crawl_error());

        index.record_task_error(crawl::Error::AccessFolderError(
            std::io::Error::other("boom").into(),
            "Sent".into(),
        ));
        index.record_walk_error(crawl::Error::AccessFolderError(
            std::io::Error::other("boom").into(),
            "Trash".into(),
        ));

        assert!(index.has_crawl_error());
        match index.first_crawl_error() {
            Some(crawl::Error::AccessFolderError(_, folder)) => assert_eq!(folder, "Trash"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
