//! One-shot directory listing as a stream.
//!
//! [`DirSnapshot`] walks a directory tree once and yields every path it
//! visits, root first, in depth-first order with siblings sorted by name.
//! It does not watch for later changes: after the last entry it returns
//! end-of-sequence.
//!
//! # Architecture
//!
//! Walking is blocking, so it runs on a dedicated worker thread spawned by
//! the first pull. Paths are handed over a zero-capacity channel: the worker
//! blocks until the consumer asks for the next one.
//!
//! ```text
//! ┌───────────────┐  rendezvous  ┌──────────────┐
//! │ walker thread │─────────────▶│  next_path   │
//! │   (walkdir)   │◀─────────────│   close()    │
//! └───────────────┘  stop signal └──────────────┘
//! ```
//!
//! Closing drops the stop sender and the receiving end, so a worker blocked
//! mid hand-off wakes immediately and stops visiting entries.
//!
//! # Errors
//!
//! A root that cannot be read ends the walk with [`WatchError::Walk`].
//! Entries below the root that vanish while the walk is in progress (for
//! example because the whole tree was deleted) are skipped, and the walk
//! ends normally. Any other failure below the root is terminal.

use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// Message from the walker thread.
enum Walked {
    Entry(PathBuf),
    Failed(WatchError),
}

enum State {
    Idle,
    Walking {
        entries: Receiver<Walked>,
        stop: Sender<()>,
        worker: JoinHandle<()>,
    },
    Done(Option<WatchError>),
}

/// Stream of every path below a root, listed once.
pub struct DirSnapshot {
    root: PathBuf,
    state: State,
}

impl DirSnapshot {
    /// Create a snapshot stream for `root`. Nothing happens until the first
    /// pull.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: State::Idle,
        }
    }

    /// The directory being listed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn start(&mut self) -> Result<(), WatchError> {
        let (entries_tx, entries) = bounded::<Walked>(0);
        let (stop, stop_rx) = bounded::<()>(0);
        let root = self.root.clone();

        let worker = thread::Builder::new()
            .name("pathwatch-walker".to_string())
            .spawn(move || walk(&root, &entries_tx, &stop_rx))
            .map_err(|e| {
                WatchError::init_failed(format!("failed to spawn walker thread: {e}"), None)
            })?;

        debug!(root = %self.root.display(), "snapshot walk started");
        self.state = State::Walking {
            entries,
            stop,
            worker,
        };
        Ok(())
    }

    /// Tear the walker down and settle on a terminal state.
    fn finish(&mut self, terminal: Option<WatchError>) {
        if let State::Walking {
            entries,
            stop,
            worker,
        } = std::mem::replace(&mut self.state, State::Done(terminal))
        {
            drop(stop);
            drop(entries);
            if worker.join().is_err() {
                tracing::warn!(root = %self.root.display(), "walker thread panicked");
            }
        }
    }
}

/// Shorthand for [`DirSnapshot::new`].
pub fn dir_snapshot(root: impl Into<PathBuf>) -> DirSnapshot {
    DirSnapshot::new(root)
}

impl Stream for DirSnapshot {
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        if matches!(self.state, State::Idle) {
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            self.start()?;
        }

        let entries = match &self.state {
            State::Walking { entries, .. } => entries,
            State::Done(Some(err)) => return Err(err.clone()),
            State::Done(None) | State::Idle => return Ok(None),
        };
        let received = ctx.recv(entries)?;

        match received {
            Ok(Walked::Entry(path)) => Ok(Some(path)),
            Ok(Walked::Failed(err)) => {
                self.finish(Some(err.clone()));
                Err(err)
            }
            Err(_) => {
                debug!(root = %self.root.display(), "snapshot walk finished");
                self.finish(None);
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<(), WatchError> {
        match self.state {
            State::Done(_) => {}
            _ => self.finish(None),
        }
        Ok(())
    }
}

impl Drop for DirSnapshot {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for DirSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Idle => "idle",
            State::Walking { .. } => "walking",
            State::Done(_) => "done",
        };
        f.debug_struct("DirSnapshot")
            .field("root", &self.root)
            .field("state", &state)
            .finish()
    }
}

/// Walker thread body. Returns when the walk ends or the consumer stops it.
fn walk(root: &Path, entries: &Sender<Walked>, stop: &Receiver<()>) {
    let hand_off = |message: Walked| -> bool {
        select! {
            send(entries, message) -> res => res.is_ok(),
            recv(stop) -> _ => false,
        }
    };

    for result in WalkDir::new(root).sort_by_file_name() {
        let message = match result {
            Ok(entry) => Walked::Entry(entry.into_path()),
            Err(err) if err.depth() > 0 && is_not_found(&err) => {
                trace!(error = %err, "entry vanished during walk, skipping");
                continue;
            }
            Err(err) => {
                let _ = hand_off(Walked::Failed(WatchError::walk(root, err)));
                return;
            }
        };
        if !hand_off(message) {
            trace!(root = %root.display(), "walk stopped by consumer");
            return;
        }
    }
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}
