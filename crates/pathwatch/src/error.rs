//! Error types for path streams.
//!
//! Every failure a [`Stream`](crate::Stream) can report is a [`WatchError`].
//! End-of-sequence is deliberately *not* an error: streams signal it with
//! `Ok(None)`.
//!
//! `WatchError` is `Clone` so that a constant-failure stream can hand out the
//! same error on every pull. Underlying sources are therefore held in [`Arc`].

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for stream pulls, stream release and policy setup.
#[derive(Debug, Clone, Error, Diagnostic)]
#[non_exhaustive]
pub enum WatchError {
    /// The pull context was cancelled.
    #[error("pull cancelled")]
    #[diagnostic(code(pathwatch::cancelled))]
    Cancelled,

    /// The pull context's deadline passed.
    #[error("pull deadline exceeded")]
    #[diagnostic(code(pathwatch::deadline_exceeded))]
    DeadlineExceeded,

    /// The native watcher could not be created or started.
    #[error("failed to initialize native watcher: {message}")]
    #[diagnostic(
        code(pathwatch::init_failed),
        help("Check that the platform's file notification facility is available")
    )]
    InitFailed {
        /// Human-readable error message.
        message: String,
        /// The underlying notify error, if available.
        #[source]
        source: Option<Arc<NativeError>>,
    },

    /// A watch target could not be registered.
    #[error("failed to watch path '{path}': {message}")]
    #[diagnostic(
        code(pathwatch::path_error),
        help("Ensure the path exists and you have read permissions")
    )]
    PathError {
        /// The path that could not be watched.
        path: PathBuf,
        /// Human-readable error message.
        message: String,
    },

    /// A directory walk failed.
    #[error("failed to walk '{path}'")]
    #[diagnostic(
        code(pathwatch::walk),
        help("Ensure the directory exists and every entry below it is readable")
    )]
    Walk {
        /// The entry being visited when the walk failed.
        path: PathBuf,
        /// The underlying walk error.
        #[source]
        source: Arc<walkdir::Error>,
    },

    /// The process working directory could not be resolved.
    #[error("failed to resolve the current directory")]
    #[diagnostic(code(pathwatch::current_dir))]
    CurrentDir {
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern '{pattern}'")]
    #[diagnostic(
        code(pathwatch::invalid_glob),
        help("Use `*`, `?`, `[...]` and whole-component `**` wildcards")
    )]
    InvalidGlob {
        /// The rejected pattern.
        pattern: String,
        /// Where and why compilation failed.
        #[source]
        source: Arc<glob::PatternError>,
    },

    /// A background worker went away without reporting.
    #[error("internal channel error: {message}")]
    #[diagnostic(code(pathwatch::channel_error))]
    ChannelError {
        /// Human-readable error message.
        message: String,
    },

    /// Caller-defined failure.
    #[error("{message}")]
    #[diagnostic(code(pathwatch::other))]
    Other {
        /// Human-readable error message.
        message: String,
    },
}

/// Error reported by the native notification backend.
#[cfg(feature = "native")]
pub type NativeError = notify::Error;

/// Placeholder so [`WatchError`] keeps one shape with `native` disabled.
#[cfg(not(feature = "native"))]
pub type NativeError = io::Error;

impl WatchError {
    /// Create a new `InitFailed` error.
    pub fn init_failed(message: impl Into<String>, source: Option<NativeError>) -> Self {
        Self::InitFailed {
            message: message.into(),
            source: source.map(Arc::new),
        }
    }

    /// Create a new `PathError`.
    pub fn path_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PathError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new `Walk` error. The failing entry is taken from the walk
    /// error when it carries one, else `root` is used.
    pub fn walk(root: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map_or_else(|| root.into(), std::path::Path::to_path_buf);
        Self::Walk {
            path,
            source: Arc::new(source),
        }
    }

    /// Create a new `CurrentDir` error.
    pub fn current_dir(source: io::Error) -> Self {
        Self::CurrentDir {
            source: Arc::new(source),
        }
    }

    /// Create a new `InvalidGlob` error.
    pub fn invalid_glob(pattern: impl Into<String>, source: glob::PatternError) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            source: Arc::new(source),
        }
    }

    /// Create a new `ChannelError`.
    pub fn channel_error(message: impl Into<String>) -> Self {
        Self::ChannelError {
            message: message.into(),
        }
    }

    /// Create a new caller-defined error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the pull context rather than the
    /// stream. These abort one pull only; the stream may be pulled again.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
