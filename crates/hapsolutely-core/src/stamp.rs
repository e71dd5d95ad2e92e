//! Change stamps.
//!
//! A [`Stamp`] orders events across every store, proxy and shared-result
//! slot in the process. Emitters take a stamp at the moment a mutation
//! happens and carry it inside the notification, so receivers can tell which
//! state a late-delivered event refers to.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A global counter for generating stamps. Zero is reserved for "before
/// anything happened".
static STAMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A monotonically increasing, process-wide event stamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stamp(u64);

impl Stamp {
    /// The stamp preceding every stamp handed out by [`next_stamp`].
    pub const ORIGIN: Stamp = Stamp(0);

    /// Returns the raw counter value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stamp({})", self.0)
    }
}

/// Takes the next stamp. Every call returns a stamp greater than all stamps
/// returned before it.
#[inline]
pub fn next_stamp() -> Stamp {
    Stamp(STAMP_COUNTER.fetch_add(1, Ordering::SeqCst))
}
