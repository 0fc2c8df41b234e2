//! Parallel brute-force search.
//!
//! This module provides:
//! - Multi-threaded CPU workers sharing one attempt counter
//! - First-match-wins claiming of the result
//! - Cooperative cancellation and optional attempt/time budgets
//! - Live progress counters

mod cancel;
mod cpu;
mod pool;

pub use cancel::CancelToken;
pub use cpu::SearchStats;
pub use pool::{SearchConfig, SearchError, SearchOutcome, SearchResult, WorkerPool};
