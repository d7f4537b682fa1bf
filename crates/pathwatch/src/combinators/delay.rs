use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::context::Context;
use crate::error::WatchError;
use crate::stream::Stream;

/// Holds back the first pull for a fixed duration.
///
/// The timer is armed by the first pull. If that pull is cancelled, the armed
/// deadline is kept and the next pull waits only for what remains. Once the
/// timer has fired every pull goes straight to the inner stream.
///
/// Combined with [`Repeat`](super::Repeat) this paces periodic re-listing.
#[derive(Debug)]
pub struct Delay<S> {
    duration: Duration,
    state: Timer,
    inner: S,
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    Idle,
    Armed(Instant),
    Fired,
}

impl<S: Stream> Delay<S> {
    /// Pass `inner` through once `duration` has elapsed since the first pull.
    pub const fn new(duration: Duration, inner: S) -> Self {
        Self {
            duration,
            state: Timer::Idle,
            inner,
        }
    }
}

/// Shorthand for [`Delay::new`].
pub const fn delay<S: Stream>(duration: Duration, inner: S) -> Delay<S> {
    Delay::new(duration, inner)
}

impl<S: Stream> Stream for Delay<S> {
    fn next_path(&mut self, ctx: &Context) -> Result<Option<PathBuf>, WatchError> {
        let deadline = match self.state {
            Timer::Fired => return self.inner.next_path(ctx),
            Timer::Armed(deadline) => deadline,
            Timer::Idle => {
                let deadline = Instant::now() + self.duration;
                self.state = Timer::Armed(deadline);
                deadline
            }
        };

        ctx.sleep_until(deadline)?;
        self.state = Timer::Fired;
        self.inner.next_path(ctx)
    }

    fn close(&mut self) -> Result<(), WatchError> {
        self.state = Timer::Fired;
        self.inner.close()
    }
}
