//! Native filesystem notifications as a pull stream.
//!
//! [`DirEvents`] bridges a push-based native watcher (inotify, FSEvents,
//! ReadDirectoryChangesW, via `notify`) to the pull-based [`Stream`] API.
//!
//! # Architecture
//!
//! ```text
//!   first pull                       worker thread (pinned)
//!  ┌──────────────┐ spawn  ┌──────────────────────────────────────┐
//!  │  DirEvents   │───────▶│ create watcher, watch root           │
//!  │  (Starting)  │◀───────│ report readiness                     │
//!  └──────────────┘  ready │ block on stop signal                 │
//!         │                └──────────────────────────────────────┘
//!         │                    native callback (any thread)
//!         │                ┌──────────────────────────────────────┐
//!         │   delivery     │ registry.get(handle) → sink          │
//!         └◀───────────────│ push each path, or bail when closed  │
//!                          └──────────────────────────────────────┘
//! ```
//!
//! The native callback only carries a [`Handle`]. It looks the session's
//! [`EventSink`] up in the bridge's [`Registry`]; once the session is closed
//! the handle is gone and late callbacks find nothing.
//!
//! The watcher is created, driven and dropped on the worker thread, which
//! lives exactly as long as the session.
//!
//! # Lifecycle
//!
//! `Uninitialized → Starting → Running → Closed`
//!
//! - The first pull spawns the worker and waits for readiness. A cancelled
//!   wait leaves the bridge `Starting`; the next pull keeps waiting.
//! - A setup failure is returned from that pull and the bridge goes back to
//!   `Uninitialized`, so a later pull retries.
//! - [`close`](Stream::close) tears the session down exactly once. Later
//!   pulls return end-of-sequence.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::WatchError;
use crate::handles::{Handle, Registry};
use crate::stream::Stream;

/// Paths buffered between the native callback and the consumer.
const DELIVERY_BUFFER: usize = 64;

/// Registry type shared between bridges and their native callbacks.
pub type SinkRegistry = Registry<Arc<EventSink>>;

/// Where a native callback delivers paths for one session.
#[derive(Debug)]
pub struct EventSink {
    paths: Sender<PathBuf>,
    /// Never sent on; disconnects when the session closes.
    closed: Receiver<()>,
}

impl EventSink {
    /// Push one path, giving up if the session closes first.
    ///
    /// Returns `false` once nobody will drain the delivery channel.
    fn deliver(&self, path: PathBuf) -> bool {
        select! {
            send(self.paths, path) -> res => res.is_ok(),
            recv(self.closed) -> _ => false,
        }
    }
}

/// Live resources of one native watch session.
struct Session {
    handle: Handle,
    paths: Receiver<PathBuf>,
    closed: Option<Sender<()>>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Release the session. Safe to call on a session that never became
    /// ready.
    fn shutdown(&mut self, registry: &SinkRegistry) -> Result<(), WatchError> {
        // Unblock callbacks mid-delivery before anything waits on them.
        drop(self.closed.take());
        registry.remove(self.handle);
        // Wake the worker's loop.
        drop(self.stop.take());

        match self.worker.take().map(JoinHandle::join) {
            Some(Err(_)) => Err(WatchError::channel_error("native event worker panicked")),
            _ => Ok(()),
        }
    }
}

enum State {
    Uninitialized,
    Starting {
        session: Session,
        ready: Receiver<Result<(), WatchError>>,
    },
    Running(Session),
    Closed,
}

/// Stream of paths reported by the platform's native file notifications.
///
/// Yields every path the watcher reports below `root` (recursively), one at a
/// time, as long as the bridge is open. It never ends on its own; release it
/// with [`close`](Stream::close) (also done on drop).
pub struct DirEvents {
    root: PathBuf,
    registry: Arc<SinkRegistry>,
    state: State,
}

impl DirEvents {
    /// Watch `root` with a registry private to this bridge.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, Arc::new(SinkRegistry::new()))
    }

    /// Watch `root`, registering the session in a shared `registry`.
    pub fn with_registry(root: impl Into<PathBuf>, registry: Arc<SinkRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
            state: State::Uninitialized,
        }
    }

    /// The watched directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` once the native watch is registered and delivering.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Spawn the worker and move to `Starting`.
    fn start(&mut self) -> Result<(), WatchError> {
        let (paths_tx, paths) = bounded::<PathBuf>(DELIVERY_BUFFER);
        let (closed, closed_rx) = bounded::<()>(0);
        let (stop, stop_rx) = bounded::<()>(0);
        let (ready_tx, ready) = bounded::<Result<(), WatchError>>(1);

        let sink = Arc::new(EventSink {
            paths: paths_tx,
            closed: closed_rx,
        });
        let handle = self.registry.add(sink);

        let root = self.root.clone();
        let registry = Arc::clone(&self.registry);
        let spawned = thread::Builder::new()
            .name("pathwatch-events".to_string())
            .spawn(move || run_session(&root, registry, handle, &ready_tx, &stop_rx));

        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                self.registry.remove(handle);
                return Err(WatchError::init_failed(
                    format!("failed to spawn native event worker: {e}"),
                    None,
                ));
            }
        };

        debug!(root = %self.root.display(), %handle, "native session starting");
        self.state = State::Starting {
            session: Session {
                handle,
                paths,
                closed: Some(closed),
                stop: Some(stop),
                worker: Some(worker),
            },
            ready,
        };
        Ok(())
    }

    /// Wait for the worker's readiness report and move to `Running`.
    fn await_ready(&mut self, ctx: &Context) -> Result<(), WatchError> {
        let State::Starting { ready, .. } = &self.state else {
            return Ok(());
        };
        let report = ctx.recv(ready)?;

        let State::Starting { mut session, .. } =
            std::mem::replace(&mut self.state, State::Uninitialized)
        else {
            return Ok(());
        };

        let failure = match report {
            Ok(Ok(())) => {
                debug!(
                    root = %self.root.display(),
                    handle = %session.handle,
                    "native session running"
                );
                self.state = State::Running(session);
                return Ok(());
            }
            Ok(Err(err)) => err,
            Err(_) => WatchError::channel_error("native event worker exited before reporting"),
        };

        if let Err(err) = session.shutdown(&self.registry) {
            warn!(error = %err, "failed to release native session after setup failure");
        }
        Err(failure)
    }
}

impl Stream for DirEvents {
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        if let State::Uninitialized = self.state {
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            self.start()?;
        }
        self.await_ready(ctx)?;

        let paths = match &self.state {
            State::Running(session) => &session.paths,
            _ => return Ok(None),
        };
        match ctx.recv(paths)? {
            Ok(path) => {
                trace!(path = %path.display(), "native event");
                Ok(Some(path))
            }
            Err(_) => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), WatchError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Starting { mut session, .. } | State::Running(mut session) => {
                debug!(
                    root = %self.root.display(),
                    handle = %session.handle,
                    "native session closing"
                );
                session.shutdown(&self.registry)
            }
            State::Uninitialized | State::Closed => Ok(()),
        }
    }
}

impl Drop for DirEvents {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to release native session on drop");
        }
    }
}

impl std::fmt::Debug for DirEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Uninitialized => "uninitialized",
            State::Starting { .. } => "starting",
            State::Running(_) => "running",
            State::Closed => "closed",
        };
        f.debug_struct("DirEvents")
            .field("root", &self.root)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

/// Worker thread body: owns the native watcher for the session's lifetime.
fn run_session(
    root: &Path,
    registry: Arc<SinkRegistry>,
    handle: Handle,
    ready: &Sender<Result<(), WatchError>>,
    stop: &Receiver<()>,
) {
    let raw = handle.into_raw();
    let created = notify::recommended_watcher(move |res: notify::Result<Event>| {
        on_native_event(&registry, Handle::from_raw(raw), res);
    });

    let mut watcher: RecommendedWatcher = match created {
        Ok(watcher) => watcher,
        Err(e) => {
            let _ = ready.send(Err(WatchError::init_failed(
                format!("failed to create native watcher: {e}"),
                Some(e),
            )));
            return;
        }
    };

    if let Err(e) = watcher.watch(root, RecursiveMode::Recursive) {
        let _ = ready.send(Err(WatchError::path_error(root, format!("failed to watch: {e}"))));
        return;
    }

    if ready.send(Ok(())).is_err() {
        return;
    }

    // Nothing is ever sent; the owner drops the sender to stop the session.
    let _ = stop.recv();

    if let Err(e) = watcher.unwatch(root) {
        trace!(error = %e, "unwatch during shutdown failed");
    }
    drop(watcher);
    debug!(root = %root.display(), %handle, "native session stopped");
}

/// Native callback: translate one batch into individual deliveries.
fn on_native_event(registry: &SinkRegistry, handle: Handle, res: notify::Result<Event>) {
    let event = match res {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "native watcher reported an error");
            return;
        }
    };
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    let Some(sink) = registry.get(handle) else {
        trace!(%handle, "event for a closed session dropped");
        return;
    };
    for path in event.paths {
        if !sink.deliver(path) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::tempdir;

    #[test]
    fn test_close_before_first_pull() {
        let dir = tempdir().unwrap();
        let mut events = DirEvents::new(dir.path());
        assert!(events.close().is_ok());
        assert_eq!(events.next_path(&Context::background()).unwrap(), None);
    }

    #[test]
    fn test_missing_root_is_retryable() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("later");
        let registry = Arc::new(SinkRegistry::new());
        let mut events = DirEvents::with_registry(&root, Arc::clone(&registry));

        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let err = events.next_path(&ctx).unwrap_err();
        assert!(matches!(err, WatchError::PathError { .. }), "{err:?}");
        assert!(matches!(events.state, State::Uninitialized));
        assert!(registry.is_empty());

        std::fs::create_dir(&root).unwrap();
        let quick = Context::background().with_timeout(Duration::from_millis(500));
        assert!(matches!(
            events.next_path(&quick),
            Err(WatchError::DeadlineExceeded)
        ));
        assert!(events.is_running());
        assert_eq!(registry.len(), 1);

        events.close().unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancelled_readiness_wait_resumes() {
        let dir = tempdir().unwrap();

        // The deadline has to expire after the worker is spawned but before
        // it reports; retry with a fresh bridge until that window is hit.
        let mut events = None;
        for _ in 0..50 {
            let mut candidate = DirEvents::new(dir.path());
            let tight = Context::background().with_timeout(Duration::from_micros(30));
            let result = candidate.next_path(&tight);
            if matches!(candidate.state, State::Starting { .. }) {
                assert!(result.unwrap_err().is_cancellation());
                events = Some(candidate);
                break;
            }
        }
        let mut events = events.expect("never observed a pending readiness wait");

        let ctx = Context::background().with_timeout(Duration::from_millis(500));
        assert!(matches!(
            events.next_path(&ctx),
            Err(WatchError::DeadlineExceeded)
        ));
        assert!(events.is_running());
        events.close().unwrap();
    }

    #[test]
    fn test_sink_stops_after_close() {
        let (paths_tx, _paths) = bounded::<PathBuf>(0);
        let (closed, closed_rx) = bounded::<()>(0);
        let sink = EventSink {
            paths: paths_tx,
            closed: closed_rx,
        };
        drop(closed);
        // Nobody drains `_paths`, yet delivery returns instead of blocking.
        assert!(!sink.deliver(PathBuf::from("x")));
    }

    #[test]
    fn test_callback_ignores_removed_handle() {
        let registry = SinkRegistry::new();
        let (paths_tx, paths) = bounded::<PathBuf>(4);
        let (_closed, closed_rx) = bounded::<()>(0);
        let handle = registry.add(Arc::new(EventSink {
            paths: paths_tx,
            closed: closed_rx,
        }));

        let event = Event::new(EventKind::Any).add_path(PathBuf::from("/a"));
        on_native_event(&registry, handle, Ok(event.clone()));
        assert_eq!(paths.try_recv().unwrap(), PathBuf::from("/a"));

        registry.remove(handle);
        on_native_event(&registry, handle, Ok(event));
        assert!(paths.try_recv().is_err());
    }
}
