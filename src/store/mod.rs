//! # Mail store
//!
//! Module dedicated to the abstract mail store consumed by the
//! crawler. The crawler is handed an already-authenticated [`Store`]
//! handle and only ever reads from it: it opens folders, counts and
//! fetches messages, but never mutates the remote store.
//!
//! Implement [`Store`], [`Folder`] and [`FolderSession`] for your
//! protocol, then drive a crawl with
//! [`CrawlBuilder`](crate::crawl::CrawlBuilder).

use async_trait::async_trait;

use crate::{envelope::Envelope, AnyResult};

/// The well-known name of the inbox folder.
pub const INBOX: &str = "INBOX";

/// The folder kind enumeration.
///
/// Tells which kind of content a folder can hold. Folders holding
/// messages get their message ranges crawled, folders holding
/// subfolders get recursed into, and folders holding neither are
/// recorded but produce no work.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum FolderKind {
    /// The folder holds messages only.
    Messages,

    /// The folder holds subfolders only.
    Folders,

    /// The folder holds both messages and subfolders.
    #[default]
    MessagesAndFolders,

    /// The folder holds neither messages nor subfolders.
    Empty,
}

impl FolderKind {
    /// Return `true` if the folder can hold messages.
    pub fn holds_messages(&self) -> bool {
        matches!(self, Self::Messages | Self::MessagesAndFolders)
    }

    /// Return `true` if the folder can hold subfolders.
    pub fn holds_folders(&self) -> bool {
        matches!(self, Self::Folders | Self::MessagesAndFolders)
    }
}

/// The effective open mode of a folder session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// The abstract mail store handle.
///
/// The handle is shared across pool workers, so implementations must
/// support concurrent folder opens (or serialize them internally).
#[async_trait]
pub trait Store: Send + Sync {
    /// Open the root folder of the store hierarchy.
    async fn open_root_folder(&self) -> AnyResult<Box<dyn Folder>>;

    /// Open a folder given its full (hierarchy-qualified) name.
    async fn open_folder(&self, full_name: &str) -> AnyResult<Box<dyn Folder>>;
}

/// A folder of the store hierarchy.
#[async_trait]
pub trait Folder: Send + Sync {
    /// The full (hierarchy-qualified) name of the folder.
    fn full_name(&self) -> &str;

    /// The hierarchy separator of the store.
    ///
    /// Only queried on the root folder, exactly once per crawl.
    fn separator(&self) -> char;

    /// The kind of content this folder can hold.
    fn kind(&self) -> FolderKind;

    /// Open a read-only session on this folder.
    async fn open_read_only(&self) -> AnyResult<Box<dyn FolderSession>>;

    /// List the immediate child folders of this folder.
    async fn list_child_folders(&self) -> AnyResult<Vec<Box<dyn Folder>>>;
}

/// An open session on a folder.
///
/// A session scopes the folder connection of one crawl step: the
/// crawler closes it on every exit path, success or failure.
#[async_trait]
pub trait FolderSession: Send + Sync {
    /// The effective open mode of the session.
    ///
    /// Some stores upgrade an open to read-write when another path
    /// already holds the folder open; the crawler checks this before
    /// trusting [`FolderSession::message_count`].
    fn mode(&self) -> OpenMode;

    /// Return `true` if the folder carries messages marked for
    /// deletion, which inflate the message count until expunged.
    fn has_pending_deletions(&self) -> bool;

    /// Expunge messages marked for deletion.
    async fn expunge(&mut self) -> AnyResult<()>;

    /// The number of messages currently in the folder.
    fn message_count(&self) -> u32;

    /// Fetch the envelopes of the messages numbered `first..=last`.
    async fn fetch_range(&mut self, first: u32, last: u32) -> AnyResult<Vec<Envelope>>;

    /// Close the session, releasing the folder connection.
    async fn close(self: Box<Self>) -> AnyResult<()>;
}
