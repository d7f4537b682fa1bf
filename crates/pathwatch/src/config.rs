//! Layered configuration for watch policies.
//!
//! Values are resolved from lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. A TOML file (optional)
//! 3. `PATHWATCH_*` environment variables
//!
//! Command-line front-ends apply their flags on top of the result.
//!
//! ```toml
//! root = "src"
//! glob = "**/*.rs"
//! backend = "native"        # or "poll"
//! poll_interval_ms = 5000
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PATHWATCH_ROOT` | `root` |
//! | `PATHWATCH_GLOB` | `glob` |
//! | `PATHWATCH_BACKEND` | `backend` |
//! | `PATHWATCH_POLL_INTERVAL_MS` | `poll_interval_ms` |

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;

use crate::policy::{Backend, DEFAULT_POLL_INTERVAL, DirWatch};

/// Pattern matching every path below the root.
pub const MATCH_ALL: &str = "**/*";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PATHWATCH_";

/// Error type for loading a [`WatchConfig`].
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration file: {path}")]
    #[diagnostic(
        code(pathwatch::config::read_error),
        help("check file permissions and ensure it's readable")
    )]
    ReadError {
        /// Path to the file.
        path: String,

        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error with source location.
    #[error("TOML parse error in {path}")]
    #[diagnostic(code(pathwatch::config::parse_error))]
    Parse {
        /// Path to the file.
        path: String,

        /// The source file content for display.
        #[source_code]
        src: NamedSource<String>,

        /// The location of the error.
        #[label("{message}")]
        span: SourceSpan,

        /// Description of what went wrong.
        message: String,

        /// Suggestion for how to fix.
        #[help]
        help: String,
    },

    /// Parse error without source location.
    #[error("TOML parse error: {message}")]
    #[diagnostic(code(pathwatch::config::parse_error))]
    ParseNoSpan {
        /// Description of what went wrong.
        message: String,
    },

    /// An environment variable holds an unusable value.
    #[error("invalid value for {var}: {value:?}")]
    #[diagnostic(code(pathwatch::config::invalid_env))]
    InvalidEnv {
        /// The variable name.
        var: String,

        /// The rejected value.
        value: String,

        /// What was expected instead.
        #[help]
        expected: String,
    },
}

/// Which change source a config selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Periodic re-listing.
    #[default]
    Poll,
    /// Native notifications.
    Native,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" => Ok(Self::Poll),
            "native" => Ok(Self::Native),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}

/// Settings for a [`DirWatch`] policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Directory to watch; the working directory when unset.
    pub root: Option<PathBuf>,

    /// Only paths matching this glob are reported.
    pub glob: String,

    /// How changes are discovered after the first listing.
    pub backend: BackendKind,

    /// Pause between re-listings for the poll backend.
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: None,
            glob: MATCH_ALL.to_string(),
            backend: BackendKind::Poll,
            poll_interval_ms: u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(60_000),
        }
    }
}

impl WatchConfig {
    /// Load defaults, then `path` if given, then the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or an
    /// environment variable holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse TOML text. `name` labels the source in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] with the offending span when available.
    pub fn from_toml_str(content: &str, name: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| parse_error(&e, content, name))
    }

    /// Apply `PATHWATCH_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for unparsable values.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| format!("{ENV_PREFIX}{name}");

        if let Some(root) = lookup(&var("ROOT")) {
            self.root = Some(PathBuf::from(root));
        }
        if let Some(glob) = lookup(&var("GLOB")) {
            self.glob = glob;
        }
        if let Some(value) = lookup(&var("BACKEND")) {
            self.backend = value.parse().map_err(|expected| ConfigError::InvalidEnv {
                var: var("BACKEND"),
                value: value.clone(),
                expected,
            })?;
        }
        if let Some(value) = lookup(&var("POLL_INTERVAL_MS")) {
            self.poll_interval_ms = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: var("POLL_INTERVAL_MS"),
                value: value.clone(),
                expected: "a whole number of milliseconds".to_string(),
            })?;
        }
        Ok(self)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The backend this config selects.
    ///
    /// Without the `native` feature a native request falls back to polling.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self.backend {
            #[cfg(feature = "native")]
            BackendKind::Native => Backend::Native,
            #[cfg(not(feature = "native"))]
            BackendKind::Native => {
                tracing::warn!("native backend not compiled in, polling instead");
                Backend::Poll {
                    interval: self.poll_interval(),
                }
            }
            BackendKind::Poll => Backend::Poll {
                interval: self.poll_interval(),
            },
        }
    }

    /// Build the policy, resolving a relative or missing root against `cwd`.
    ///
    /// A relative `glob` is anchored at the resolved root, so `**/*.rs`
    /// means "Rust files below the root" whatever the working directory.
    #[must_use]
    pub fn to_watch(&self, cwd: &Path) -> DirWatch {
        let root = match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd.to_path_buf(),
        };
        let pattern = anchor(&root, &self.glob);
        DirWatch::new(root).glob(pattern).backend(self.backend())
    }
}

/// Prefix a relative pattern with the (escaped) root.
fn anchor(root: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let root = glob::Pattern::escape(&root.to_string_lossy());
    format!("{}/{pattern}", root.trim_end_matches('/'))
}

fn parse_error(e: &toml::de::Error, content: &str, name: &str) -> ConfigError {
    match e.span() {
        Some(span) => ConfigError::Parse {
            path: name.to_string(),
            src: NamedSource::new(name, content.to_string()),
            span: SourceSpan::new(span.start.into(), span.end - span.start),
            message: e.message().to_string(),
            help: "check for misspelled keys, missing quotes, or invalid values".to_string(),
        },
        None => ConfigError::ParseNoSpan {
            message: e.to_string(),
        },
    }
}
