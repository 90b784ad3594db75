use std::result;

use thiserror::Error;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// Errors related to message identity derivation.
///
/// These errors are recoverable: the crawler counts the message as
/// skipped and keeps going with the rest of the batch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot derive identity of message {0}: Message-ID header is missing")]
    DeriveIdentityMissingMessageIdError(u32),
}
