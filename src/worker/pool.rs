//! Worker pool management and search coordination.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::crypto::{KeyError, Keypair};
use crate::matcher::Pattern;
use crate::stats::SearchCounters;

use super::cpu::{Claimed, CpuWorker, SearchStats, Shared, WorkerExit};
use super::CancelToken;

type WorkerHandle = JoinHandle<Result<(u64, WorkerExit), KeyError>>;

/// Library-level search configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of worker threads (at least one)
    pub workers: usize,
    /// Stop after this many attempts
    pub max_attempts: Option<u64>,
    /// Stop after this much wall-clock time
    pub max_time: Option<Duration>,
}

impl SearchConfig {
    /// Unbounded search with `workers` threads.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            max_attempts: None,
            max_time: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Errors that end a search without an outcome.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("At least one worker is required")]
    NoWorkers,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Entropy(#[from] KeyError),

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
}

/// How a search ended.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// A worker found and claimed a matching keypair
    Found { keypair: Keypair, worker_id: usize },
    /// The cancel token was tripped before any match
    Cancelled,
    /// The attempt or time budget ran out
    Exhausted,
}

/// Terminal result of one search run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub outcome: SearchOutcome,
    /// Final counters
    pub counters: SearchCounters,
    /// When the last worker stopped
    pub finished: Instant,
    /// Attempts made by each worker, indexed by worker ID
    pub per_worker: Vec<u64>,
}

impl SearchResult {
    /// Returns the matching keypair, if any.
    pub fn keypair(&self) -> Option<&Keypair> {
        match &self.outcome {
            SearchOutcome::Found { keypair, .. } => Some(keypair),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Found { .. })
    }
}

/// Manages a pool of workers searching for one pattern.
pub struct WorkerPool {
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<WorkerHandle>>,
    /// Receives the claimed keypair
    result_rx: Receiver<Claimed>,
    /// Disconnects once every worker has exited
    done_rx: Receiver<()>,
    /// State shared with the workers
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Runs a search to completion.
    ///
    /// Blocks until a worker claims a match, the cancel token is tripped,
    /// or a budget runs out.
    pub fn run(
        pattern: Pattern,
        config: &SearchConfig,
        cancel: &CancelToken,
    ) -> Result<SearchResult, SearchError> {
        Self::spawn(pattern, config, cancel.clone())?.finish()
    }

    /// Starts the workers and returns immediately.
    pub fn spawn(
        pattern: Pattern,
        config: &SearchConfig,
        cancel: CancelToken,
    ) -> Result<Self, SearchError> {
        if config.workers == 0 {
            return Err(SearchError::NoWorkers);
        }

        let (result_tx, result_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(0);
        let shared = Arc::new(Shared::new(cancel, config.max_attempts, config.max_time));

        info!(
            pattern = %pattern,
            workers = config.workers,
            max_attempts = ?config.max_attempts,
            max_time = ?config.max_time,
            "starting search"
        );

        let handles = Self::spawn_workers(config.workers, &pattern, result_tx, done_tx, &shared)?;

        Ok(Self {
            handles: Some(handles),
            result_rx,
            done_rx,
            shared,
        })
    }

    /// Spawns worker threads. On failure, already started workers are
    /// halted and joined.
    fn spawn_workers(
        num_workers: usize,
        pattern: &Pattern,
        result_tx: Sender<Claimed>,
        done_tx: Sender<()>,
        shared: &Arc<Shared>,
    ) -> Result<Vec<WorkerHandle>, SearchError> {
        let mut handles = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let worker = CpuWorker::new(id, pattern.clone(), result_tx.clone(), shared.clone());
            let done_tx = done_tx.clone();

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || {
                    let outcome = worker.run();
                    drop(done_tx);
                    outcome
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    shared.halt();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SearchError::Spawn(e));
                }
            }
        }

        Ok(handles)
    }

    /// Waits up to `timeout` for every worker to exit.
    ///
    /// Returns true once the search is over.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.done_rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected) | Ok(())
        )
    }

    /// Joins every worker and builds the result.
    pub fn finish(mut self) -> Result<SearchResult, SearchError> {
        let handles = self.handles.take().unwrap_or_default();
        let mut per_worker = Vec::with_capacity(handles.len());
        let mut failure = None;

        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok((attempts, exit))) => {
                    debug!(worker = id, attempts, ?exit, "worker joined");
                    per_worker.push(attempts);
                }
                Ok(Err(e)) => {
                    failure.get_or_insert(SearchError::Entropy(e));
                    per_worker.push(0);
                }
                Err(_) => {
                    failure.get_or_insert(SearchError::WorkerPanicked(id));
                    per_worker.push(0);
                }
            }
        }

        let finished = Instant::now();
        if let Some(e) = failure {
            return Err(e);
        }

        let outcome = match self.result_rx.try_recv() {
            Ok(Claimed { worker_id, keypair }) => SearchOutcome::Found { keypair, worker_id },
            Err(_) if self.shared.cancel.is_cancelled() => SearchOutcome::Cancelled,
            Err(_) => SearchOutcome::Exhausted,
        };

        let counters = self.shared.stats.snapshot();
        info!(attempts = counters.attempts, outcome = outcome_name(&outcome), "search finished");

        Ok(SearchResult {
            outcome,
            counters,
            finished,
            per_worker,
        })
    }

    /// Signals all workers to stop without cancelling the caller's token.
    pub fn stop(&self) {
        self.shared.halt();
    }

    /// Returns the live counters.
    pub fn stats(&self) -> Arc<SearchStats> {
        self.shared.stats.clone()
    }

    /// Returns true once a worker has claimed a match.
    pub fn is_found(&self) -> bool {
        self.shared.is_found()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        // Wait for workers to finish if they haven't been joined
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

fn outcome_name(outcome: &SearchOutcome) -> &'static str {
    match outcome {
        SearchOutcome::Found { .. } => "found",
        SearchOutcome::Cancelled => "cancelled",
        SearchOutcome::Exhausted => "exhausted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Placement;

    fn pattern(s: &str, placement: Placement) -> Pattern {
        Pattern::new(s, placement).unwrap()
    }

    /// 64^10 expected attempts; never found in a test.
    fn impossible() -> Pattern {
        pattern("//////////", Placement::Beginning)
    }

    fn assert_accounting(result: &SearchResult) {
        assert_eq!(result.per_worker.iter().sum::<u64>(), result.counters.attempts);
    }

    #[test]
    fn test_empty_pattern_single_worker() {
        let result = WorkerPool::run(
            pattern("", Placement::Anywhere),
            &SearchConfig::new(1),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(result.is_found());
        assert_eq!(result.counters.attempts, 1);
        assert_eq!(result.per_worker, vec![1]);
    }

    #[test]
    fn test_single_and_multi_worker_agree() {
        for workers in [1, 4] {
            let p = pattern("a", Placement::Beginning);
            let config = SearchConfig::new(workers);
            let result = WorkerPool::run(p.clone(), &config, &CancelToken::new()).unwrap();

            let keypair = result.keypair().expect("match");
            assert!(p.matches(keypair.public_key().as_str()));
            assert!(result.counters.attempts >= 1);
            assert_eq!(result.per_worker.len(), workers);
            assert_accounting(&result);
        }
    }

    #[test]
    fn test_found_keypair_is_consistent() {
        let result = WorkerPool::run(
            pattern("ab", Placement::Anywhere),
            &SearchConfig::new(2),
            &CancelToken::new(),
        )
        .unwrap();

        let keypair = result.keypair().unwrap();
        let rederived = Keypair::from_private_bytes(*keypair.private_key_bytes());
        assert_eq!(rederived.public_key(), keypair.public_key());
        match result.outcome {
            SearchOutcome::Found { worker_id, .. } => assert!(worker_id < 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_attempt_budget_is_exact_under_contention() {
        let config = SearchConfig::new(8).with_max_attempts(800);
        let result = WorkerPool::run(impossible(), &config, &CancelToken::new()).unwrap();

        assert!(matches!(result.outcome, SearchOutcome::Exhausted));
        assert_eq!(result.counters.attempts, 800);
        assert_accounting(&result);
    }

    #[test]
    fn test_time_budget() {
        let config = SearchConfig::new(2).with_max_time(Duration::from_millis(50));
        let result = WorkerPool::run(impossible(), &config, &CancelToken::new()).unwrap();

        assert!(matches!(result.outcome, SearchOutcome::Exhausted));
        assert!(result.keypair().is_none());
        assert_accounting(&result);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = WorkerPool::run(impossible(), &SearchConfig::new(3), &cancel).unwrap();
        assert!(matches!(result.outcome, SearchOutcome::Cancelled));
        assert_eq!(result.counters.attempts, 0);
        assert_eq!(result.per_worker, vec![0, 0, 0]);
    }

    #[test]
    fn test_cancel_mid_search_stops_promptly() {
        let workers = 4;
        let cancel = CancelToken::new();
        let config = SearchConfig::new(workers);
        let pool = WorkerPool::spawn(impossible(), &config, cancel.clone()).unwrap();
        let stats = pool.stats();

        assert!(!pool.wait_timeout(Duration::from_millis(50)));
        cancel.cancel();
        let at_cancel = stats.total_attempts();

        let result = pool.finish().unwrap();
        assert!(matches!(result.outcome, SearchOutcome::Cancelled));
        assert!(result.keypair().is_none());
        assert!(result.counters.attempts <= at_cancel + workers as u64);
        assert_accounting(&result);
    }

    #[test]
    fn test_wait_timeout_reports_completion() {
        let pool = WorkerPool::spawn(
            pattern("", Placement::Anywhere),
            &SearchConfig::new(2),
            CancelToken::new(),
        )
        .unwrap();

        assert!(pool.wait_timeout(Duration::from_secs(10)));
        assert!(pool.is_found());
        assert!(pool.finish().unwrap().is_found());
    }

    #[test]
    fn test_published_match_beats_later_cancel() {
        let cancel = CancelToken::new();
        let pool = WorkerPool::spawn(
            pattern("", Placement::Anywhere),
            &SearchConfig::new(4),
            cancel.clone(),
        )
        .unwrap();

        assert!(pool.wait_timeout(Duration::from_secs(10)));
        cancel.cancel();

        let result = pool.finish().unwrap();
        assert!(result.is_found());
        assert!(result.keypair().is_some());
        assert_accounting(&result);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = WorkerPool::run(impossible(), &SearchConfig::new(0), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, SearchError::NoWorkers));
    }

    #[test]
    fn test_dropping_pool_stops_workers() {
        let cancel = CancelToken::new();
        let pool = WorkerPool::spawn(impossible(), &SearchConfig::new(2), cancel.clone()).unwrap();
        drop(pool);
        assert!(!cancel.is_cancelled());
    }
}
