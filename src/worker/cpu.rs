//! CPU worker loop and the state it shares with its siblings.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::crypto::{KeyError, Keypair};
use crate::matcher::Pattern;
use crate::stats::SearchCounters;

use super::CancelToken;

/// Live counters for a running search.
#[derive(Debug)]
pub struct SearchStats {
    /// Attempts reserved so far, across all workers
    attempts: AtomicU64,
    /// Start time
    started: Instant,
}

impl SearchStats {
    fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Returns the total attempts made so far.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the current rate (attempts per second).
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> SearchCounters {
        SearchCounters {
            attempts: self.total_attempts(),
            started: self.started,
        }
    }
}

/// State shared by every worker of one search.
///
/// Only atomics: the attempt counter, the found claim, the internal halt
/// flag and the caller's cancel token.
#[derive(Debug)]
pub(super) struct Shared {
    pub stats: Arc<SearchStats>,
    pub cancel: CancelToken,
    found: AtomicBool,
    halted: AtomicBool,
    max_attempts: u64,
    deadline: Option<Instant>,
}

impl Shared {
    pub fn new(cancel: CancelToken, max_attempts: Option<u64>, max_time: Option<Duration>) -> Self {
        let stats = Arc::new(SearchStats::new());
        let deadline = max_time.map(|t| stats.started + t);
        Self {
            stats,
            cancel,
            found: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            max_attempts: max_attempts.unwrap_or(u64::MAX),
            deadline,
        }
    }

    /// Stops every worker without marking the search as cancelled.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    /// Returns true once a match was claimed.
    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    #[inline]
    fn should_stop(&self) -> bool {
        if self.cancel.is_cancelled()
            || self.found.load(Ordering::Acquire)
            || self.halted.load(Ordering::Acquire)
        {
            return true;
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.halt();
                true
            }
            _ => false,
        }
    }

    /// Takes one slot from the attempt budget. False once it is spent.
    #[inline]
    fn reserve_attempt(&self) -> bool {
        let max = self.max_attempts;
        self.stats
            .attempts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < max).then(|| n + 1)
            })
            .is_ok()
    }

    /// Claims the result. Exactly one caller ever gets true.
    #[inline]
    fn claim(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Halts the search if the owning worker unwinds.
struct HaltOnPanic<'a>(&'a Shared);

impl Drop for HaltOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.halt();
        }
    }
}

/// A matching keypair published by the worker that won the claim.
#[derive(Debug)]
pub(super) struct Claimed {
    pub worker_id: usize,
    pub keypair: Keypair,
}

/// How a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WorkerExit {
    /// This worker won the claim and published its keypair
    Matched,
    /// Stopped by cancellation, budget, or another worker's match
    Stopped,
}

/// A CPU worker that generates and tests keypairs.
pub(super) struct CpuWorker {
    /// Worker ID
    id: usize,
    /// The pattern to match against
    pattern: Pattern,
    /// Channel for the claimed result
    result_tx: Sender<Claimed>,
    /// State shared with the other workers
    shared: Arc<Shared>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        pattern: Pattern,
        result_tx: Sender<Claimed>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            pattern,
            result_tx,
            shared,
        }
    }

    /// Runs the worker loop and returns the number of attempts it made.
    ///
    /// Each iteration checks the stop conditions, reserves an attempt,
    /// generates a keypair and tests it. A matching worker that loses the
    /// claim drops its keypair.
    pub fn run(&self) -> Result<(u64, WorkerExit), KeyError> {
        debug!(worker = self.id, "worker started");
        let _guard = HaltOnPanic(&self.shared);
        let mut attempts = 0u64;

        let exit = loop {
            if self.shared.should_stop() {
                break WorkerExit::Stopped;
            }

            if !self.shared.reserve_attempt() {
                debug!(worker = self.id, "attempt budget exhausted");
                self.shared.halt();
                break WorkerExit::Stopped;
            }

            let keypair = match Keypair::generate() {
                Ok(keypair) => keypair,
                Err(e) => {
                    self.shared.halt();
                    return Err(e);
                }
            };
            attempts += 1;

            if self.pattern.matches(keypair.public_key().as_str()) {
                if !self.shared.claim() {
                    break WorkerExit::Stopped;
                }

                info!(worker = self.id, public_key = %keypair.public_key(), "match claimed");
                // Capacity is one and only the claim winner sends.
                let _ = self.result_tx.send(Claimed {
                    worker_id: self.id,
                    keypair,
                });
                break WorkerExit::Matched;
            }
        };

        debug!(worker = self.id, attempts, ?exit, "worker stopped");
        Ok((attempts, exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> Arc<Shared> {
        Arc::new(Shared::new(CancelToken::new(), None, None))
    }

    #[test]
    fn test_panicking_worker_halts_siblings() {
        let shared = shared();
        let remote = shared.clone();

        let joined = thread::spawn(move || {
            let _guard = HaltOnPanic(&remote);
            panic!("worker failed");
        })
        .join();

        assert!(joined.is_err());
        assert!(shared.should_stop());
    }

    #[test]
    fn test_guard_is_quiet_on_normal_exit() {
        let shared = shared();
        drop(HaltOnPanic(&shared));
        assert!(!shared.should_stop());
    }

    #[test]
    fn test_attempts_per_second() {
        let stats = SearchStats::new();
        assert_eq!(stats.total_attempts(), 0);
        assert_eq!(stats.attempts_per_second(), 0.0);

        stats.attempts.fetch_add(50, Ordering::Relaxed);
        thread::sleep(Duration::from_millis(20));

        let rate = stats.attempts_per_second();
        assert!(rate > 0.0);
        // At least 20ms have passed, so no more than 50 / 0.02.
        assert!(rate <= 2_500.0, "{rate}");
        assert_eq!(stats.snapshot().attempts, 50);
    }

    #[test]
    fn test_claim_has_one_winner() {
        let shared = shared();
        let winners: usize = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.claim())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(winners, 1);
        assert!(shared.is_found());
    }
}
