//! Runtime configuration for the vanity key generator.

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;

use crate::matcher::{Pattern, PatternError, Placement};
use crate::worker::SearchConfig;

/// Curve25519 vanity key generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The string to find in the public key (base64 characters, at most 10)
    #[arg(required_unless_present = "doctest")]
    pub pattern: Option<String>,

    /// Where to find the string in the public key: anywhere or beginning
    #[arg(short = 'p', long = "place", default_value = "anywhere")]
    pub placement: Placement,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Stop after this many attempts (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_attempts: u64,

    /// Stop after this many seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_time: u64,

    /// Progress report interval in seconds (0 = silent)
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Run the built-in known-answer checks and exit (also accepted as -dt)
    #[arg(long)]
    pub doctest: bool,

    /// Log worker activity
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Config {
    /// Parses the process arguments, accepting the `-dt` spelling of `--doctest`.
    pub fn from_args() -> Self {
        Self::parse_from(expand_legacy_args(std::env::args_os()))
    }

    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration and builds the pattern.
    pub fn validate(&self) -> Result<Pattern, ConfigError> {
        if self.worker_count() == 0 {
            return Err(ConfigError::InvalidWorkers);
        }

        let raw = self.pattern.as_deref().unwrap_or_default();
        Ok(Pattern::new(raw, self.placement)?)
    }

    /// Returns the library search configuration.
    pub fn search_config(&self) -> SearchConfig {
        let mut config = SearchConfig::new(self.worker_count());
        if self.max_attempts > 0 {
            config = config.with_max_attempts(self.max_attempts);
        }
        if self.max_time > 0 {
            config = config.with_max_time(Duration::from_secs(self.max_time));
        }
        config
    }

    /// Returns the progress interval, if reporting is enabled.
    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval > 0).then(|| Duration::from_secs(self.report_interval))
    }
}

/// Rewrites `-dt` to `--doctest`; clap would read it as `-d -t`.
pub fn expand_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| if arg == "-dt" { OsString::from("--doctest") } else { arg })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("Worker count must be at least 1")]
    InvalidWorkers,
}
