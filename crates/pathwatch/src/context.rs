//! Cancellable pull context.
//!
//! Every [`Stream::next_path`](crate::Stream::next_path) call receives a
//! [`Context`]. Each blocking point inside a stream (channel receive, timer
//! wait, readiness wait) selects over the context as well, so a pull returns
//! [`WatchError::Cancelled`] or [`WatchError::DeadlineExceeded`] promptly
//! instead of hanging.
//!
//! Cancelling a context only aborts the pull in progress. The stream keeps
//! its state and may be pulled again with a fresh context.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use pathwatch::Context;
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! match stream.next_path(&ctx) {
//!     Ok(Some(path)) => println!("{}", path.display()),
//!     Ok(None) => println!("done"),
//!     Err(err) if err.is_cancellation() => println!("nothing within 5s"),
//!     Err(err) => return Err(err),
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvError, Select, Sender, TryRecvError, bounded};
use parking_lot::Mutex;

use crate::error::WatchError;

/// Cancellation scope for a pull.
///
/// Contexts are cheap to clone. Derived contexts (`with_cancel`,
/// `with_timeout`, `with_deadline`) observe every ancestor's cancellation and
/// the earliest deadline in the chain.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// One receiver per cancellable ancestor. Nothing is ever sent; a
    /// receiver becomes ready when its sender is dropped.
    cancels: Vec<Receiver<()>>,

    /// Earliest deadline in the chain.
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] it was created with.
///
/// The handle is cloneable and can be used from any thread. Dropping every
/// clone also cancels the context, so keep it alive for as long as the
/// context should stay usable.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<Mutex<Option<Sender<()>>>>,
}

impl CancelHandle {
    /// Cancel the context. Idempotent.
    pub fn cancel(&self) {
        self.sender.lock().take();
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is additionally cancelled by the returned handle.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = bounded::<()>(0);
        let mut child = self.clone();
        child.cancels.push(rx);
        let handle = CancelHandle {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (child, handle)
    }

    /// Derive a context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that expires at `deadline`, or earlier if an ancestor
    /// does.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        child
    }

    /// The effective deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error a pull under this context should return right now, if any.
    ///
    /// Cancellation takes precedence over an expired deadline.
    #[must_use]
    pub fn err(&self) -> Option<WatchError> {
        let cancelled = self
            .cancels
            .iter()
            .any(|rx| matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
        if cancelled {
            return Some(WatchError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(WatchError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Receive from `rx` unless the context ends first.
    ///
    /// The outer `Result` carries the context error; the inner one is the
    /// channel's own result (`Err` once every sender is gone).
    pub fn recv<T>(&self, rx: &Receiver<T>) -> Result<Result<T, RecvError>, WatchError> {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let mut sel = Select::new();
        let target = sel.recv(rx);
        for cancel in &self.cancels {
            sel.recv(cancel);
        }

        let oper = match self.deadline {
            Some(deadline) => match sel.select_deadline(deadline) {
                Ok(oper) => oper,
                Err(_) => return Err(WatchError::DeadlineExceeded),
            },
            None => sel.select(),
        };

        let index = oper.index();
        if index == target {
            return Ok(oper.recv(rx));
        }
        // Cancellation receivers occupy the indices after the target.
        let _ = oper.recv(&self.cancels[index - 1]);
        Err(WatchError::Cancelled)
    }

    /// Block until `instant` unless the context ends first.
    pub fn sleep_until(&self, instant: Instant) -> Result<(), WatchError> {
        let timer = crossbeam_channel::at(instant);
        self.recv(&timer).map(|_| ())
    }
}
