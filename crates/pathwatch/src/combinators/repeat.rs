use std::path::PathBuf;

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// Recreates its inner stream every time it is exhausted.
///
/// The factory is called lazily on the first pull and again after each
/// end-of-sequence, so `Repeat` itself never ends on its own. Any error ends
/// it: the error is returned unchanged and the current child is kept.
///
/// Closing forwards to the active child and makes `Repeat` terminal, so no
/// new child is created after release.
pub struct Repeat<F, S> {
    create: F,
    current: Option<S>,
    closed: bool,
}

impl<F, S> Repeat<F, S>
where
    F: FnMut() -> S + Send,
    S: Stream,
{
    /// Build children with `create`, first on demand and then after each
    /// exhaustion.
    pub const fn new(create: F) -> Self {
        Self {
            create,
            current: None,
            closed: false,
        }
    }
}

/// Shorthand for [`Repeat::new`].
pub const fn repeat<F, S>(create: F) -> Repeat<F, S>
where
    F: FnMut() -> S + Send,
    S: Stream,
{
    Repeat::new(create)
}

impl<F, S> Stream for Repeat<F, S>
where
    F: FnMut() -> S + Send,
    S: Stream,
{
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let child = self.current.get_or_insert_with(&mut self.create);
            if let Some(path) = child.next_path(ctx)? {
                return Ok(Some(path));
            }
            if let Some(mut spent) = self.current.take()
                && let Err(err) = spent.close()
            {
                tracing::warn!(error = %err, "failed to release exhausted stream");
            }
            tracing::debug!("inner stream exhausted, restarting");
        }
    }

    fn close(&mut self) -> Result<(), WatchError> {
        self.closed = true;
        match self.current.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }
}

impl<F, S: std::fmt::Debug> std::fmt::Debug for Repeat<F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repeat")
            .field("current", &self.current)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{IterStream, error, from_paths};
    use crate::stream::{BoxStream, collect};

    #[test]
    fn test_repeat_until_error() {
        let mut streams: Vec<BoxStream> = vec![
            Box::new(from_paths(["hello", "world"])) as BoxStream,
            Box::new(from_paths(["boo", "hoo"])),
            Box::new(error(WatchError::other("some error"))),
        ]
        .into_iter()
        .rev()
        .collect();
        let mut stream = repeat(move || {
            streams
                .pop()
                .expect("factory called past the error stream")
        });

        let (got, end) = collect(&mut stream, &Context::background());
        let expected: Vec<PathBuf> = ["hello", "world", "boo", "hoo"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(got, expected);
        assert!(matches!(end, Err(WatchError::Other { ref message }) if message == "some error"));

        // The failing child is kept, not replaced.
        assert!(stream.next_path(&Context::background()).is_err());
        assert!(stream.close().is_ok());
    }

    #[test]
    fn test_repeat_is_lazy() {
        let stream = repeat(|| -> IterStream { panic!("factory called eagerly") });
        assert!(stream.current.is_none());
    }

    #[test]
    fn test_repeat_terminal_after_close() {
        let mut stream = repeat(|| from_paths(["x"]));
        let ctx = Context::background();
        assert_eq!(stream.next_path(&ctx).unwrap(), Some(PathBuf::from("x")));
        assert!(stream.close().is_ok());
        assert!(stream.close().is_ok());
        assert_eq!(stream.next_path(&ctx).unwrap(), None);
    }
}
