use std::{any::Any, error, io, result};

/// The global any `Result` alias of the library.
///
/// The difference with [`crate::crawl::Result`] is that it takes a
/// dynamic error `Box<dyn AnyError>`.
pub type AnyResult<T> = result::Result<T, AnyBoxedError>;

/// The global, downcastable any `Error` trait of the library.
///
/// Store implementations produce error types that are not known at
/// compilation time, so the store traits cannot expose them in a
/// generic due to object-safe trait constraints. They are carried as
/// boxed [`AnyError`]s instead, and wrapped by the crawl layer into
/// [`crate::crawl::Error`] variants.
pub trait AnyError: error::Error + Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl AnyError for io::Error {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The global any boxed `Error` alias of the library.
pub type AnyBoxedError = Box<dyn AnyError + Send + 'static>;

impl error::Error for AnyBoxedError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.as_ref().source()
    }
}

impl From<io::Error> for AnyBoxedError {
    fn from(err: io::Error) -> Self {
        Box::new(err)
    }
}
