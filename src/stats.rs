//! Elapsed time and throughput derived from a finished search.

use std::time::{Duration, Instant};

/// Final counters of a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCounters {
    /// Total key pairs generated and checked
    pub attempts: u64,
    /// When the search started
    pub started: Instant,
}

/// Duration and rate, rounded for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    /// Elapsed seconds, rounded to 3 decimals
    pub duration_secs: f64,
    /// Attempts per second, rounded to 2 decimals
    pub attempts_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    /// The run was too short to measure; no rate can be given.
    #[error("{attempts} attempts finished in under a millisecond, rate is undefined")]
    DegenerateDuration { attempts: u64 },
}

/// Summarizes a run that ended at `end`.
pub fn summarize(counters: &SearchCounters, end: Instant) -> Result<Throughput, StatsError> {
    throughput(
        counters.attempts,
        end.saturating_duration_since(counters.started),
    )
}

/// Computes rounded duration and rate for `attempts` over `elapsed`.
///
/// Fails when the duration rounds to zero milliseconds.
pub fn throughput(attempts: u64, elapsed: Duration) -> Result<Throughput, StatsError> {
    let duration_secs = round_to(elapsed.as_secs_f64(), 3);
    if duration_secs == 0.0 {
        return Err(StatsError::DegenerateDuration { attempts });
    }

    Ok(Throughput {
        duration_secs,
        attempts_per_second: round_to(attempts as f64 / duration_secs, 2),
    })
}

/// Rounds to nearest on the exact binary value, ties to even.
fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
