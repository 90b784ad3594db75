//! # Envelope
//!
//! Module dedicated to message envelopes and identities. The crawler
//! only ever fetches the few headers needed to recognize "the same
//! message" across two independent crawls of possibly different
//! stores: the [`Envelope`]. From it derives the [`MessageIdentity`],
//! the value the later diff stage compares.

mod error;

use std::fmt;

#[doc(inline)]
pub use self::error::{Error, Result};

/// The message address.
///
/// Only the address part takes part in equality: display names vary
/// freely between stores.
#[derive(Clone, Debug, Default, Eq)]
pub struct Mailbox {
    /// The optional display name.
    pub name: Option<String>,

    /// The email address.
    pub addr: String,
}

impl Mailbox {
    pub fn new(name: Option<impl ToString>, addr: impl ToString) -> Self {
        Self {
            name: name.map(|name| name.to_string()),
            addr: addr.to_string(),
        }
    }

    pub fn new_nameless(addr: impl ToString) -> Self {
        Self {
            name: None,
            addr: addr.to_string(),
        }
    }
}

impl PartialEq for Mailbox {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// The message envelope, as fetched by a
/// [`FolderSession`](crate::store::FolderSession).
///
/// Carries the headers the identity derives from, plus the message
/// sequence number within its folder (for diagnostics only: sequence
/// numbers are not stable across stores or time).
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// The message sequence number within its folder.
    pub number: u32,

    /// The Message-ID header, if any.
    pub message_id: Option<String>,

    /// The From header addresses.
    pub from: Vec<Mailbox>,

    /// The To header addresses.
    pub to: Vec<Mailbox>,

    /// The Subject header, if any.
    pub subject: Option<String>,
}

/// The store-independent message identity.
///
/// An immutable value derived from store-assigned message headers.
/// Equality and hashing are value-based: two identities are equal iff
/// their normalized keys match, whatever store or crawl produced
/// them.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MessageIdentity {
    message_id: String,
    from: Vec<String>,
    to: Vec<String>,
    subject: String,
}

impl MessageIdentity {
    /// Derive the identity of the given envelope.
    ///
    /// Fails when the Message-ID header is missing or blank: such a
    /// message cannot be recognized across stores, so the crawler
    /// counts it as skipped.
    pub fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
        let message_id = envelope
            .message_id
            .as_deref()
            .map(normalize_message_id)
            .filter(|id| !id.is_empty())
            .ok_or(Error::DeriveIdentityMissingMessageIdError(envelope.number))?;

        Ok(Self {
            message_id,
            from: normalize_addrs(&envelope.from),
            to: normalize_addrs(&envelope.to),
            subject: normalize_subject(envelope.subject.as_deref().unwrap_or_default()),
        })
    }

    /// The normalized Message-ID the identity derives from.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

fn normalize_message_id(id: &str) -> String {
    id.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_lowercase()
}

fn normalize_addrs(mailboxes: &[Mailbox]) -> Vec<String> {
    let mut addrs: Vec<String> = mailboxes
        .iter()
        .map(|mailbox| mailbox.addr.trim().to_lowercase())
        .collect();
    // header ordering is not stable across stores
    addrs.sort();
    addrs
}

fn normalize_subject(subject: &str) -> String {
    let mut subject = subject.trim();

    loop {
        let stripped = ["re:", "fw:", "fwd:"]
            .iter()
            .find_map(|prefix| strip_prefix_ignore_ascii_case(subject, prefix));

        match stripped {
            Some(rest) => subject = rest.trim_start(),
            None => break,
        }
    }

    subject.to_lowercase()
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
