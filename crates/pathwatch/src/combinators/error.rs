use std::path::PathBuf;

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// A stream that fails every pull with the same error.
///
/// Policies use it to defer setup failures (an unreadable working directory,
/// an invalid glob) to the first pull, so constructors stay infallible.
#[derive(Debug, Clone)]
pub struct ErrorStream {
    err: WatchError,
}

impl ErrorStream {
    /// A stream that always fails with `err`.
    pub const fn new(err: WatchError) -> Self {
        Self { err }
    }
}

/// Shorthand for [`ErrorStream::new`].
pub const fn error(err: WatchError) -> ErrorStream {
    ErrorStream::new(err)
}

impl Stream for ErrorStream {
    fn next_path(&mut self, _ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        Err(self.err.clone())
    }
}
