//! # pathwatch
//!
//! Composable, pull-based file change streams.
//!
//! Filesystem activity (an initial listing plus every later change) is
//! exposed as one abstraction: a [`Stream`] of paths that the caller pulls
//! under a cancellable [`Context`]. Watch policies are built by layering
//! small combinators over a source.
//!
//! ## Sources
//!
//! | Source | Yields |
//! |--------|--------|
//! | [`DirSnapshot`] | Every path below a root, once, then end-of-sequence |
//! | [`DirEvents`] | Paths reported by native notifications, until closed |
//!
//! ## Combinators
//!
//! | Combinator | Effect |
//! |------------|--------|
//! | [`Filter`](combinators::Filter) | Keep paths accepted by a predicate (e.g. [`glob`]) |
//! | [`Dedup`](combinators::Dedup) | Drop paths whose checksum did not change |
//! | [`Delay`](combinators::Delay) | Wait once before the first pass-through |
//! | [`Repeat`](combinators::Repeat) | Recreate the inner stream when exhausted |
//! | [`ErrorStream`](combinators::ErrorStream) | Fail every pull |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pathwatch::{Context, current_dir};
//!
//! fn main() -> Result<(), pathwatch::WatchError> {
//!     // Every .rs file now, then whatever changes, re-listed each minute.
//!     let mut stream = current_dir("**/*.rs");
//!     let ctx = Context::background();
//!     while let Some(path) = stream.next_path(&ctx)? {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Signals
//!
//! - `Ok(Some(path))`: the next path.
//! - `Ok(None)`: end-of-sequence. Stop pulling.
//! - `Err(e)` with [`WatchError::is_cancellation`]: the context ended; the
//!   stream is untouched and may be pulled again.
//! - Any other `Err`: terminal failure. Stop pulling.
//!
//! Streams that own threads or native sessions release them in
//! [`Stream::close`], which is idempotent and also runs on drop.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `native` (default) | [`DirEvents`] and [`Backend::Native`] via `notify` |
//! | `config` (default) | [`WatchConfig`]: TOML file + `PATHWATCH_*` env vars |

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod combinators;
pub mod context;
pub mod error;
pub mod handles;
pub mod pattern;
pub mod policy;
pub mod snapshot;
pub mod stream;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "config")]
pub mod config;

pub use context::{CancelHandle, Context};
pub use error::WatchError;
pub use handles::{Handle, Registry};
pub use pattern::glob;
pub use policy::{Backend, DEFAULT_POLL_INTERVAL, DirWatch, current_dir, dir};
pub use snapshot::{DirSnapshot, dir_snapshot};
pub use stream::{BoxStream, Stream, close, collect};

#[cfg(feature = "native")]
pub use native::DirEvents;

#[cfg(feature = "config")]
pub use config::{BackendKind, ConfigError, WatchConfig};
