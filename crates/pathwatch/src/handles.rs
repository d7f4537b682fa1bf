//! Handle registry for crossing callback boundaries.
//!
//! Native notification callbacks can only carry an integer back into our
//! code. The owner registers a value under a [`Handle`], passes the raw
//! integer across, and the callback (running on whatever thread the native
//! facility chooses) looks the value back up.
//!
//! ```text
//! owner thread                       native callback thread
//! ────────────                       ──────────────────────
//! h = registry.add(sink)
//! start_native(h.into_raw()) ──────▶ callback(raw)
//!                                      registry.get(Handle::from_raw(raw))
//! registry.remove(h)                   → None once removed
//! ```
//!
//! # Token policy
//!
//! Tokens come from a monotonically increasing `u64` counter and are never
//! reused, so a lookup racing with removal at shutdown finds nothing rather
//! than someone else's value. At one registration per nanosecond the counter
//! lasts for centuries; [`Registry::add`] panics instead of wrapping.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

/// Opaque token identifying a registered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// The raw integer to hand across a callback boundary.
    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from a raw integer received from a callback.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Inner<V> {
    next: u64,
    items: HashMap<Handle, V>,
}

/// Thread-safe table mapping handles to values.
///
/// The registry owns its values until they are removed. Every operation is a
/// single short critical section on one mutex and never blocks on anything
/// else, so it is safe to call from native callback threads while the owner
/// is tearing a session down.
pub struct Registry<V> {
    inner: Mutex<Inner<V>>,
}

impl<V> Registry<V> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next: 0,
                items: HashMap::new(),
            }),
        }
    }

    /// Store `value` and return a fresh handle for it.
    ///
    /// # Panics
    ///
    /// Panics if the registry has handed out `u64::MAX` handles.
    pub fn add(&self, value: V) -> Handle {
        let mut inner = self.inner.lock();
        let handle = Handle(inner.next);
        inner.next = inner
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("handle registry exhausted"));
        inner.items.insert(handle, value);
        handle
    }

    /// Remove a handle. Returns `true` if it was present.
    pub fn remove(&self, handle: Handle) -> bool {
        self.inner.lock().items.remove(&handle).is_some()
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Returns `true` if no handles are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Registry<V> {
    /// Look up a handle. Removed or never-issued handles yield `None`.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<V> {
        self.inner.lock().items.get(&handle).cloned()
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Registry")
            .field("live", &inner.items.len())
            .field("next", &inner.next)
            .finish()
    }
}
