use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// Yields only the paths accepted by a predicate.
///
/// Rejected paths are pulled and discarded until one is accepted or the
/// inner stream terminates; its terminal signal is passed through.
#[derive(Debug)]
pub struct Filter<P, S> {
    allow: P,
    inner: S,
}

impl<P, S> Filter<P, S>
where
    P: FnMut(&Path) -> bool + Send,
    S: Stream,
{
    /// Keep the paths of `inner` for which `allow` returns `true`.
    pub const fn new(allow: P, inner: S) -> Self {
        Self { allow, inner }
    }
}

/// Shorthand for [`Filter::new`].
pub const fn filter<P, S>(allow: P, inner: S) -> Filter<P, S>
where
    P: FnMut(&Path) -> bool + Send,
    S: Stream,
{
    Filter::new(allow, inner)
}

impl<P, S> Stream for Filter<P, S>
where
    P: FnMut(&Path) -> bool + Send,
    S: Stream,
{
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        loop {
            match self.inner.next_path(ctx)? {
                Some(path) if !(self.allow)(&path) => continue,
                next => return Ok(next),
            }
        }
    }

    fn close(&mut self) -> Result<(), WatchError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::from_paths;
    use crate::stream::collect;

    #[test]
    fn test_filter_keeps_matches_in_order() {
        let inner = from_paths(["hello", "boo", "world", "hoo"]);
        let mut stream = filter(|p: &Path| p == Path::new("world"), inner);

        let (got, end) = collect(&mut stream, &Context::background());
        assert_eq!(got, vec![PathBuf::from("world")]);
        assert!(end.is_ok());
        assert!(stream.close().is_ok());
    }

    #[test]
    fn test_filter_passes_errors() {
        let inner = crate::combinators::error(WatchError::other("broken"));
        let mut stream = filter(|_: &Path| true, inner);
        let err = stream.next_path(&Context::background()).unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }
}
