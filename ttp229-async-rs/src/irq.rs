//! Edge-interrupt flag latch.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Latched edge state shared between the edge wait and the read path.
///
/// `notify_edge` only performs atomic operations, so it is also safe to call
/// from a raw GPIO interrupt handler. The read path clears the flags while the
/// edge wait is not running, which keeps the two sides disjoint.
pub struct EdgeFlags {
    pending: AtomicBool,
    ignore_next: AtomicBool,
    edges: AtomicU32,
}

impl EdgeFlags {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            ignore_next: AtomicBool::new(false),
            edges: AtomicU32::new(0),
        }
    }

    /// Records a rising edge on the data line.
    ///
    /// When the device held the line asserted past the end of the previous
    /// read it emits one spurious edge on letting go; that edge is swallowed
    /// here and `false` is returned instead of latching an event.
    pub fn notify_edge(&self) -> bool {
        if self.ignore_next.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.pending.store(true, Ordering::Release);
        self.edges.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// An edge has been seen and not yet fully turned into events.
    pub fn pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn clear_pending(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub(crate) fn set_ignore_next(&self, ignore: bool) {
        self.ignore_next.store(ignore, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn ignore_next(&self) -> bool {
        self.ignore_next.load(Ordering::Acquire)
    }

    /// Total number of accepted (non-suppressed) edges since construction.
    pub fn edge_count(&self) -> u32 {
        self.edges.load(Ordering::Relaxed)
    }
}

impl Default for EdgeFlags {
    fn default() -> Self {
        Self::new()
    }
}
