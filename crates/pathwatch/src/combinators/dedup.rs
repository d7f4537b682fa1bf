use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// Checksum a path by its last-modified time.
///
/// Paths that cannot be stat'ed (deleted, unreadable) have no checksum, so
/// [`Dedup`] lets them through every time.
pub fn last_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Drops paths whose checksum matches the one seen last time.
///
/// The first occurrence of a path always passes. A checksum of `None` means
/// "cannot tell": the path passes and any cached checksum for it is
/// forgotten.
pub struct Dedup<F, C, S> {
    checksum: F,
    seen: HashMap<PathBuf, C>,
    inner: S,
}

impl<F, C, S> Dedup<F, C, S>
where
    F: FnMut(&Path) -> Option<C> + Send,
    C: PartialEq + Send,
    S: Stream,
{
    /// Suppress repeats of `inner`'s paths, comparing by `checksum`.
    pub fn new(checksum: F, inner: S) -> Self {
        Self {
            checksum,
            seen: HashMap::new(),
            inner,
        }
    }

    /// Number of paths with a cached checksum.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.seen.len()
    }

    fn allow(&mut self, path: &Path) -> bool {
        let current = (self.checksum)(path);
        if let (Some(old), Some(new)) = (self.seen.get(path), current.as_ref())
            && old == new
        {
            return false;
        }

        match current {
            Some(sum) => {
                self.seen.insert(path.to_path_buf(), sum);
            }
            None => {
                self.seen.remove(path);
            }
        }
        true
    }
}

/// Shorthand for [`Dedup::new`].
pub fn dedup<F, C, S>(checksum: F, inner: S) -> Dedup<F, C, S>
where
    F: FnMut(&Path) -> Option<C> + Send,
    C: PartialEq + Send,
    S: Stream,
{
    Dedup::new(checksum, inner)
}

impl<F, C, S> Stream for Dedup<F, C, S>
where
    F: FnMut(&Path) -> Option<C> + Send,
    C: PartialEq + Send,
    S: Stream,
{
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        loop {
            match self.inner.next_path(ctx)? {
                Some(path) if !self.allow(&path) => {
                    tracing::trace!(path = %path.display(), "unchanged, skipping");
                }
                next => return Ok(next),
            }
        }
    }

    fn close(&mut self) -> Result<(), WatchError> {
        self.inner.close()
    }
}

impl<F, C, S: std::fmt::Debug> std::fmt::Debug for Dedup<F, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dedup")
            .field("cached", &self.seen.len())
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::from_paths;
    use crate::stream::collect;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_last_modified() {
        assert!(last_modified(Path::new("goop-does-not-exist")).is_none());

        let file = tempfile::NamedTempFile::new().unwrap();
        let first = last_modified(file.path());
        assert!(first.is_some());
        assert_eq!(first, last_modified(file.path()));
    }

    #[test]
    fn test_dedup_uniques() {
        let mut counter = 0;
        let checksum = move |_: &Path| {
            counter += 1;
            Some(counter)
        };
        let mut stream = dedup(checksum, from_paths(["hello", "boo", "world", "hoo"]));

        let (got, end) = collect(&mut stream, &Context::background());
        assert_eq!(got, paths(&["hello", "boo", "world", "hoo"]));
        assert!(end.is_ok());
    }

    #[test]
    fn test_dedup_no_cache() {
        let mut stream = dedup(
            |_: &Path| None::<u32>,
            from_paths(["hello", "boo", "hello", "hoo"]),
        );

        let (got, end) = collect(&mut stream, &Context::background());
        assert_eq!(got, paths(&["hello", "boo", "hello", "hoo"]));
        assert!(end.is_ok());
        assert_eq!(stream.cached(), 0);
    }

    #[test]
    fn test_dedup_with_dupes() {
        let mut stream = dedup(
            |p: &Path| Some(p.to_path_buf()),
            from_paths(["hello", "boo", "hello", "hoo"]),
        );

        let (got, end) = collect(&mut stream, &Context::background());
        assert_eq!(got, paths(&["hello", "boo", "hoo"]));
        assert!(end.is_ok());
    }

    #[test]
    fn test_dedup_absent_checksum_uncaches() {
        // "a" is cached, then becomes unreadable, then comes back unchanged.
        let mut sums = vec![Some(1), None, Some(1)].into_iter();
        let mut stream = dedup(
            move |_: &Path| sums.next().flatten(),
            from_paths(["a", "a", "a"]),
        );

        let (got, _) = collect(&mut stream, &Context::background());
        assert_eq!(got.len(), 3);
    }
}
