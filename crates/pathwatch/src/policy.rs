//! Ready-made watch policies.
//!
//! Every policy has the same shape: list the tree once, then keep reporting
//! changes forever, with unchanged paths suppressed by last-modified time.
//!
//! ```text
//! Dedup(last_modified,
//!   Repeat(
//!     first:  [Filter(glob,)] DirSnapshot(root)
//!     later:  [Filter(glob,)] Delay(interval, DirSnapshot(root))   -- Backend::Poll
//!             [Filter(glob,)] DirEvents(root)                      -- Backend::Native
//!   ))
//! ```
//!
//! [`dir`] and [`current_dir`] cover the common cases; [`DirWatch`] exposes
//! every knob.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::combinators::{dedup, delay, error, filter, last_modified, repeat};
use crate::error::WatchError;
use crate::pattern::glob;
use crate::snapshot::DirSnapshot;
use crate::stream::BoxStream;

/// Pause between re-listings when polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How changes are discovered after the initial listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Re-list the whole tree after each interval.
    Poll {
        /// Pause before each re-listing.
        interval: Duration,
    },
    /// Follow the platform's native notifications.
    #[cfg(feature = "native")]
    Native,
}

impl Default for Backend {
    fn default() -> Self {
        Self::Poll {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A snapshot of `root` followed by every later change, polled every
/// [`DEFAULT_POLL_INTERVAL`].
pub fn dir(root: impl Into<PathBuf>) -> BoxStream {
    DirWatch::new(root).build()
}

/// Like [`dir`], rooted at the process's working directory and restricted to
/// paths matching `pattern`.
///
/// A working directory that cannot be resolved, or an invalid pattern, yields
/// a stream that fails every pull with that error.
pub fn current_dir(pattern: &str) -> BoxStream {
    match std::env::current_dir() {
        Ok(cwd) => DirWatch::new(cwd).glob(pattern).build(),
        Err(e) => Box::new(error(WatchError::current_dir(e))),
    }
}

/// Builder for a watch policy.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use pathwatch::{Backend, Context, DirWatch};
///
/// let mut stream = DirWatch::new("src")
///     .glob("**/*.rs")
///     .backend(Backend::Poll { interval: Duration::from_secs(5) })
///     .build();
///
/// while let Some(path) = stream.next_path(&Context::background())? {
///     println!("{}", path.display());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DirWatch {
    root: PathBuf,
    pattern: Option<String>,
    backend: Backend,
}

impl DirWatch {
    /// Watch `root` by polling at [`DEFAULT_POLL_INTERVAL`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: None,
            backend: Backend::default(),
        }
    }

    /// Only report paths matching `pattern` (see [`glob`]).
    #[must_use]
    pub fn glob(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Choose how changes are discovered.
    #[must_use]
    pub const fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Poll with the given interval.
    #[must_use]
    pub const fn poll_interval(self, interval: Duration) -> Self {
        self.backend(Backend::Poll { interval })
    }

    /// The directory being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Assemble the stream.
    ///
    /// Setup errors (an invalid pattern) are reported by the first pull.
    #[must_use]
    pub fn build(self) -> BoxStream {
        let Self {
            root,
            pattern,
            backend,
        } = self;

        let allow = match pattern.as_deref().map(glob).transpose() {
            Ok(allow) => allow,
            Err(err) => return Box::new(error(err)),
        };

        tracing::debug!(root = %root.display(), ?pattern, ?backend, "building watch policy");

        let mut first = true;
        let changes = repeat(move || -> BoxStream {
            let source: BoxStream = if std::mem::take(&mut first) {
                Box::new(DirSnapshot::new(&root))
            } else {
                later(&root, backend)
            };
            match allow.clone() {
                Some(allow) => Box::new(filter(allow, source)),
                None => source,
            }
        });

        Box::new(dedup(last_modified, changes))
    }
}

/// The stream that follows the initial listing.
fn later(root: &Path, backend: Backend) -> BoxStream {
    match backend {
        Backend::Poll { interval } => Box::new(delay(interval, DirSnapshot::new(root))),
        #[cfg(feature = "native")]
        Backend::Native => Box::new(crate::native::DirEvents::new(root)),
    }
}
