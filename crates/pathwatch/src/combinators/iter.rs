use std::collections::VecDeque;
use std::path::PathBuf;

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// A finite stream over paths already in memory.
#[derive(Debug, Clone, Default)]
pub struct IterStream {
    paths: VecDeque<PathBuf>,
}

impl IterStream {
    /// Yield `paths` in order, then end.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Paths not yet pulled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

/// Shorthand for [`IterStream::new`].
pub fn from_paths<I, P>(paths: I) -> IterStream
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    IterStream::new(paths)
}

impl Stream for IterStream {
    fn next_path(&mut self, _ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        Ok(self.paths.pop_front())
    }
}
