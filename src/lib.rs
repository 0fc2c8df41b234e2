//! # wg_vanity
//!
//! Brute-force search for Curve25519 keypairs whose base64 public key
//! contains a chosen string.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and base64 encoding
//! - `matcher`: Pattern validation and matching
//! - `worker`: Parallel search, cancellation and budgets
//! - `stats`: Duration and throughput of a finished search
//! - `selftest`: Known-answer checks runnable from the CLI
//! - `config`: Command-line configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod selftest;
pub mod stats;
pub mod worker;

pub use config::Config;
pub use crypto::{EncodedKey, KeyError, Keypair};
pub use matcher::{Pattern, PatternError, Placement};
pub use stats::{summarize, SearchCounters, StatsError, Throughput};
pub use worker::{
    CancelToken, SearchConfig, SearchError, SearchOutcome, SearchResult, SearchStats, WorkerPool,
};
