//! Curve25519 Vanity Key Generator CLI
//!
//! Usage:
//!   wg-vanity wg                 # Find a public key containing "wg"
//!   wg-vanity -p beginning Home  # Find a public key starting with "home"
//!   wg-vanity --doctest          # Run the built-in known-answer checks

use std::process;

use tracing_subscriber::EnvFilter;

use wg_vanity::selftest::run_self_test;
use wg_vanity::{summarize, CancelToken, Config, SearchOutcome, SearchResult, WorkerPool};

const EXIT_INVALID: i32 = 1;
const EXIT_FAILED: i32 = 2;

fn main() {
    let config = Config::from_args();
    init_logging(config.verbose);

    if config.doctest {
        process::exit(if print_self_test() { 0 } else { EXIT_FAILED });
    }

    // Validate configuration
    let pattern = match config.validate() {
        Ok(pattern) => pattern,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(EXIT_INVALID);
        }
    };

    let search = config.search_config();

    // Print startup info
    println!("Curve25519 Vanity Key Generator");
    println!("===============================");
    println!("Pattern:    {}", pattern);
    println!("Difficulty: {}", pattern.difficulty_description());
    println!("Workers:    {}", search.workers);
    println!();

    // Set up ctrl-c handler
    let cancel = CancelToken::new();
    ctrlc_handler(cancel.clone());

    println!("Generating keys, this can take a long time... (Press Ctrl+C to stop)\n");

    let pool = match WorkerPool::spawn(pattern, &search, cancel) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Search failed: {}", e);
            process::exit(EXIT_FAILED);
        }
    };

    if let Some(interval) = config.report_interval() {
        while !pool.wait_timeout(interval) {
            print_progress(&pool);
        }
    }

    match pool.finish() {
        Ok(result) => print_result(&result),
        Err(e) => {
            eprintln!("Search failed: {}", e);
            process::exit(EXIT_FAILED);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(result: &SearchResult) {
    match &result.outcome {
        SearchOutcome::Found { keypair, worker_id } => {
            println!("The following keypair matches (worker {}):\n", worker_id);
            println!(
                "Private key: {}\tPublic key: {}\n",
                keypair.private_key(),
                keypair.public_key()
            );
        }
        SearchOutcome::Cancelled => println!("CTRL-C detected, aborting...\n"),
        SearchOutcome::Exhausted => println!("Search budget exhausted, no match found.\n"),
    }

    let attempts = result.counters.attempts;
    match summarize(&result.counters, result.finished) {
        Ok(t) => println!(
            "{} keys generated in {} seconds ({} keys per second).\n",
            attempts, t.duration_secs, t.attempts_per_second
        ),
        Err(_) => println!(
            "{} keys generated in 0 seconds (rate not measurable).\n",
            attempts
        ),
    }
}

fn print_progress(pool: &WorkerPool) {
    let stats = pool.stats();
    println!(
        "[{:>4}s] Generated {} keys ({}/s)",
        stats.elapsed().as_secs(),
        format_number(stats.total_attempts()),
        format_number(stats.attempts_per_second() as u64)
    );
}

fn print_self_test() -> bool {
    let checks = run_self_test();
    let mut all_passed = true;

    for check in &checks {
        let status = if check.passed { "ok" } else { "FAILED" };
        println!("{:<32} {:<6} {}", check.name, status, check.detail);
        all_passed &= check.passed;
    }

    let passed = checks.iter().filter(|c| c.passed).count();
    println!("\n{} of {} checks passed.", passed, checks.len());
    all_passed
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(cancel: CancelToken) {
    if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
        eprintln!("Warning: could not install Ctrl-C handler: {}", e);
    }
}
