//! Stream-to-stream transformers.
//!
//! Each combinator wraps an inner [`Stream`](crate::Stream) and composes
//! without knowing what produced it:
//!
//! | Combinator | Behavior |
//! |------------|----------|
//! | [`Filter`] | Drop paths failing a predicate |
//! | [`Dedup`] | Drop paths whose checksum did not change |
//! | [`Delay`] | Wait once before the first pass-through |
//! | [`Repeat`] | Recreate the inner stream whenever it is exhausted |
//! | [`ErrorStream`] | Fail every pull with the same error |
//! | [`IterStream`] | Yield a fixed list of paths |
//!
//! Order is never changed, and errors pass through untouched except that
//! [`Repeat`] absorbs end-of-sequence.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use pathwatch::combinators::{dedup, delay, filter, last_modified, repeat};
//! use pathwatch::{BoxStream, DirSnapshot};
//!
//! // Re-list `src` every ten seconds, surfacing only changed `.rs` files.
//! let mut first = true;
//! let rs = pathwatch::glob("**/*.rs")?;
//! let stream = dedup(last_modified, filter(rs, repeat(move || -> BoxStream {
//!     let snap = DirSnapshot::new("src");
//!     if std::mem::take(&mut first) {
//!         Box::new(snap)
//!     } else {
//!         Box::new(delay(Duration::from_secs(10), snap))
//!     }
//! })));
//! ```

mod dedup;
mod delay;
mod error;
mod filter;
mod iter;
mod repeat;

pub use dedup::{Dedup, dedup, last_modified};
pub use delay::{Delay, delay};
pub use error::{ErrorStream, error};
pub use filter::{Filter, filter};
pub use iter::{IterStream, from_paths};
pub use repeat::{Repeat, repeat};
