//! The [`Stream`] trait shared by every producer and combinator.

use std::path::PathBuf;

use crate::context::Context;
use crate::error::WatchError;

/// A cancellable, pull-based producer of paths.
///
/// Each call to [`next_path`](Stream::next_path) yields:
/// - `Ok(Some(path))` for the next path,
/// - `Ok(None)` once the sequence is exhausted,
/// - `Err(err)` on cancellation (see [`WatchError::is_cancellation`]) or
///   failure.
///
/// Callers must stop pulling after `Ok(None)` or a non-cancellation error.
/// Streams in this crate keep returning the same terminal signal, but that
/// is not part of the contract.
///
/// Streams that own threads or native resources release them in
/// [`close`](Stream::close). Streams that own nothing keep the default no-op.
pub trait Stream: Send {
    /// Pull the next path.
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError>;

    /// Release owned resources. Must be safe to call more than once.
    fn close(&mut self) -> Result<(), WatchError> {
        Ok(())
    }
}

/// A boxed stream, used where policies mix stream types.
pub type BoxStream = Box<dyn Stream>;

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        (**self).next_path(ctx)
    }

    fn close(&mut self) -> Result<(), WatchError> {
        (**self).close()
    }
}

/// Release a stream's resources.
pub fn close<S: Stream + ?Sized>(stream: &mut S) -> Result<(), WatchError> {
    stream.close()
}

/// Pull until the stream terminates, collecting every path.
///
/// Returns the paths together with the terminal signal: `Ok(())` for
/// end-of-sequence or the error that stopped the pull. Never call this on a
/// stream that does not end on its own without a deadline on `ctx`.
pub fn collect<S: Stream + ?Sized>(
    stream: &mut S,
    ctx: &Context,
) -> (Vec<PathBuf>, Result<(), WatchError>) {
    let mut paths = Vec::new();
    loop {
        match stream.next_path(ctx) {
            Ok(Some(path)) => paths.push(path),
            Ok(None) => return (paths, Ok(())),
            Err(err) => return (paths, Err(err)),
        }
    }
}
