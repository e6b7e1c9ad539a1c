//! # Reusable Sync Point
//!
//! A generation-counting barrier: all participants must reach [`SyncPoint::wait`]
//! before any proceeds past it, and the same instance can be reused at
//! arbitrary points within a frame (there is no separate "reset" step).
//!
//! The pool's end-of-frame wait is a drain (task-count latch), not this
//! barrier; `SyncPoint` is for task groups of known size that need a strict
//! phase boundary, e.g. physics fully done before render-prep starts.

use parking_lot::{Condvar, Mutex};

struct BarrierState {
    arrived: usize,
    generation: u64,
}

/// Reusable barrier for a fixed number of participants.
pub struct SyncPoint {
    participants: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl SyncPoint {
    /// Creates a sync point for `participants` threads.
    ///
    /// # Panics
    ///
    /// Panics if `participants` is zero.
    #[must_use]
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "a sync point needs at least one participant");
        Self {
            participants,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
            }),
            cvar: Condvar::new(),
        }
    }

    /// Blocks until all participants have arrived, then releases everyone.
    ///
    /// The generation counter makes the barrier immediately reusable: a
    /// thread racing ahead into the next `wait` cannot leak through the
    /// previous release.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.participants {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
        } else {
            while state.generation == generation {
                self.cvar.wait(&mut state);
            }
        }
    }

    /// Number of participating threads.
    #[must_use]
    pub fn participants(&self) -> usize {
        self.participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_single_participant_never_blocks() {
        let point = SyncPoint::new(1);
        point.wait();
        point.wait();
    }

    #[test]
    fn test_all_participants_released_together() {
        const THREADS: usize = 4;
        let point = Arc::new(SyncPoint::new(THREADS));
        let before = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let point = Arc::clone(&point);
                let before = Arc::clone(&before);
                thread::spawn(move || {
                    before.fetch_add(1, Ordering::SeqCst);
                    point.wait();
                    // Nobody passes the barrier until everyone arrived.
                    assert_eq!(before.load(Ordering::SeqCst), THREADS);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_reusable_across_generations() {
        const THREADS: usize = 3;
        const ROUNDS: usize = 50;
        let point = Arc::new(SyncPoint::new(THREADS));
        let phase = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let point = Arc::clone(&point);
                let phase = Arc::clone(&phase);
                thread::spawn(move || {
                    for round in 0..ROUNDS {
                        point.wait();
                        // Every thread observes the same phase inside a round.
                        assert!(phase.load(Ordering::SeqCst) >= round);
                        point.wait();
                        phase.fetch_max(round + 1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(phase.load(Ordering::SeqCst), ROUNDS);
    }
}
