//! The shared match counter.
//!
//! A [`Tally`] is created at zero for each run, handed to every worker as a
//! [`TallyHandle`], and read once the completion barrier is satisfied. Three
//! strategies trade contention for immediacy:
//!
//! - [`TallyMode::Locked`]: every match takes a mutex. This is the classic
//!   shape of the pattern and the most contended.
//! - [`TallyMode::Atomic`]: every match is a single `fetch_add` on a
//!   cache-padded counter.
//! - [`TallyMode::Merged`]: each worker counts locally and folds its subtotal
//!   into the shared total once, when it finishes. Addition is associative, so
//!   the total is the same; the only shared write is one per worker.
//!
//! A handle folds its subtotal when it is dropped, including while a panicking
//! worker unwinds, so matches recorded before a panic are never lost.

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How workers record matches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TallyMode {
    /// Mutex-guarded counter, one lock per match.
    Locked,
    /// Cache-padded atomic counter, one `fetch_add` per match.
    Atomic,
    /// Per-worker subtotals folded in once per worker.
    #[default]
    Merged,
}

enum Shared {
    Locked(CachePadded<Mutex<u64>>),
    Atomic(CachePadded<AtomicU64>),
}

/// The run-wide match total.
#[derive(Clone)]
pub struct Tally {
    mode: TallyMode,
    shared: Arc<Shared>,
}

impl Tally {
    pub fn new(mode: TallyMode) -> Self {
        let shared = match mode {
            TallyMode::Locked => Shared::Locked(CachePadded::new(Mutex::new(0))),
            TallyMode::Atomic | TallyMode::Merged => {
                Shared::Atomic(CachePadded::new(AtomicU64::new(0)))
            }
        };
        Self {
            mode,
            shared: Arc::new(shared),
        }
    }

    pub const fn mode(&self) -> TallyMode {
        self.mode
    }

    /// A recording handle for one worker.
    pub fn handle(&self) -> TallyHandle {
        TallyHandle {
            tally: self.clone(),
            local: 0,
        }
    }

    /// The current total.
    ///
    /// Only meaningful once every handle has been finished or dropped; the
    /// coordinator reads it after the completion barrier.
    pub fn total(&self) -> u64 {
        match &*self.shared {
            Shared::Locked(count) => *count.lock(),
            Shared::Atomic(count) => count.load(Ordering::Acquire),
        }
    }

    fn add(&self, n: u64) {
        match &*self.shared {
            Shared::Locked(count) => *count.lock() += n,
            Shared::Atomic(count) => {
                count.fetch_add(n, Ordering::AcqRel);
            }
        }
    }
}

impl core::fmt::Debug for Tally {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tally")
            .field("mode", &self.mode)
            .field("total", &self.total())
            .finish()
    }
}

/// One worker's view of the [`Tally`].
#[derive(Debug)]
pub struct TallyHandle {
    tally: Tally,
    local: u64,
}

impl TallyHandle {
    /// Records one match.
    pub fn record(&mut self) {
        match self.tally.mode {
            TallyMode::Merged => self.local += 1,
            TallyMode::Locked | TallyMode::Atomic => self.tally.add(1),
        }
    }

    /// Folds any local subtotal into the shared total.
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for TallyHandle {
    fn drop(&mut self) {
        if self.local > 0 {
            self.tally.add(core::mem::take(&mut self.local));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const MODES: [TallyMode; 3] = [TallyMode::Locked, TallyMode::Atomic, TallyMode::Merged];

    #[test]
    fn starts_at_zero() {
        for mode in MODES {
            let tally = Tally::new(mode);
            assert_eq!(tally.total(), 0);
            assert_eq!(tally.mode(), mode);
        }
    }

    #[test]
    fn merged_subtotal_lands_on_finish() {
        let tally = Tally::new(TallyMode::Merged);
        let mut handle = tally.handle();
        handle.record();
        handle.record();
        assert_eq!(tally.total(), 0);
        handle.finish();
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn merged_subtotal_survives_a_panicking_holder() {
        let tally = Tally::new(TallyMode::Merged);
        let mut handle = tally.handle();

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            handle.record();
            handle.record();
            handle.record();
            panic!("worker blew up");
        }));

        assert!(unwound.is_err());
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn immediate_modes_count_before_finish() {
        for mode in [TallyMode::Locked, TallyMode::Atomic] {
            let tally = Tally::new(mode);
            let mut handle = tally.handle();
            handle.record();
            assert_eq!(tally.total(), 1);
            handle.finish();
            assert_eq!(tally.total(), 1);
        }
    }

    #[test]
    fn no_lost_updates_across_threads() {
        const THREADS: usize = 16;
        const PER_THREAD: u64 = 10_000;

        for mode in MODES {
            let tally = Tally::new(mode);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    let mut handle = tally.handle();
                    s.spawn(move || {
                        for _ in 0..PER_THREAD {
                            handle.record();
                        }
                        handle.finish();
                    });
                }
            });
            assert_eq!(tally.total(), THREADS as u64 * PER_THREAD, "{mode:?}");
        }
    }
}
