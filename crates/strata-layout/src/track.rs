//! Dirty-range tracking: which bytes changed since the last flush.
//!
//! A synchronization layer copies a structure across a native/driver
//! boundary; tracking lets it copy only the bytes that changed. The
//! tracker keeps an ascending, non-overlapping list of half-open byte
//! ranges and coalesces neighbours closer than [`SPLIT_THRESHOLD`],
//! bounding bookkeeping overhead at the cost of copying small gaps.

use std::sync::{Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;

/// A half-open dirty byte range `[start, end)`, relative to the tracking
/// root (the allocated or claimed most-parent structure).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRange {
    /// First dirty byte.
    pub start: usize,
    /// One past the last dirty byte.
    pub end: usize,
}

impl DirtyRange {
    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Merge distance: a new range within this many bytes of an existing one
/// is coalesced into it.
///
/// 128 bytes is the trade-off point between wasted copy bandwidth
/// (over-merging) and per-range bookkeeping (under-merging).
pub const SPLIT_THRESHOLD: usize = 128;

/// Range list state behind the tracker's lock.
#[derive(Debug, Default)]
struct TrackState {
    /// Set on any modification, cleared by a drain.
    dirty: bool,
    /// Ascending, non-overlapping. Empty when tracking is disabled.
    ranges: SmallVec<[DirtyRange; 4]>,
}

/// Records which byte ranges of one structure changed since the last drain.
///
/// `enabled` is fixed at construction. When disabled, only a single
/// "whole structure dirty" flag is kept and a drain synthesizes one range
/// covering everything — correct, just not minimal.
///
/// The lock protects only this range list. One writer thread and one
/// drain thread may operate concurrently without corrupting the list;
/// the underlying field bytes are serialized by callers, and concurrent
/// drains on the same tracker are a caller error.
#[derive(Debug)]
pub struct ModTracker {
    enabled: bool,
    state: Mutex<TrackState>,
}

impl ModTracker {
    /// Create a tracker. `enabled = false` keeps only the dirty flag.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: Mutex::new(TrackState::default()),
        }
    }

    /// Whether per-range tracking is active.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Record a modification of `len` bytes at `offset`, using the
    /// default [`SPLIT_THRESHOLD`]. Zero-length writes are ignored.
    pub fn record(&self, offset: usize, len: usize) {
        self.record_range(offset, offset.saturating_add(len), SPLIT_THRESHOLD);
    }

    /// Record `[start, end)` with an explicit merge threshold.
    ///
    /// The new range is merged into an existing node when the gap to it
    /// is at most `threshold` bytes, cascading over later nodes the
    /// merge now reaches; otherwise it is inserted preserving ascending
    /// order.
    pub fn record_range(&self, start: usize, end: usize, threshold: usize) {
        if end <= start {
            return;
        }
        let mut st = self.lock();
        st.dirty = true;
        if !self.enabled {
            return;
        }

        let ranges = &mut st.ranges;
        let mut i = 0;
        while i < ranges.len() && ranges[i].end.saturating_add(threshold) < start {
            i += 1;
        }
        if i == ranges.len() {
            ranges.push(DirtyRange { start, end });
        } else if end.saturating_add(threshold) < ranges[i].start {
            ranges.insert(i, DirtyRange { start, end });
        } else {
            ranges[i].start = ranges[i].start.min(start);
            ranges[i].end = ranges[i].end.max(end);
            // The widened node may now reach its successors.
            while i + 1 < ranges.len()
                && ranges[i].end.saturating_add(threshold) >= ranges[i + 1].start
            {
                let next = ranges.remove(i + 1);
                ranges[i].end = ranges[i].end.max(next.end);
            }
        }
    }

    /// Whether anything changed since the last drain.
    pub fn is_modified(&self) -> bool {
        self.lock().dirty
    }

    /// Drain the dirty ranges through `handler` in ascending order.
    ///
    /// Returns `false` (no handler calls) when nothing is dirty.
    /// Otherwise the dirty flag and list are taken atomically *before*
    /// the handler runs, so writes arriving during the callbacks land in
    /// the next drain — never lost, never double-reported. With tracking
    /// disabled, one `[0, whole_len)` range is synthesized.
    pub fn drain<F: FnMut(DirtyRange)>(&self, whole_len: usize, mut handler: F) -> bool {
        let taken = {
            let mut st = self.lock();
            if !st.dirty {
                return false;
            }
            st.dirty = false;
            std::mem::take(&mut st.ranges)
        };
        if self.enabled {
            for range in taken {
                handler(range);
            }
        } else {
            handler(DirtyRange {
                start: 0,
                end: whole_len,
            });
        }
        true
    }

    /// Snapshot of the current range list (diagnostics and tests).
    pub fn ranges(&self) -> Vec<DirtyRange> {
        self.lock().ranges.to_vec()
    }

    fn lock(&self) -> MutexGuard<'_, TrackState> {
        // A panicked recorder leaves the list merely incomplete, not
        // structurally broken; keep tracking.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
