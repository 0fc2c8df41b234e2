//! Known-answer checks runnable from the command line (`--doctest`).

use std::time::Duration;

use crate::crypto::{Keypair, ENCODED_KEY_LEN};
use crate::matcher::{validate, Pattern, PatternError, Placement};
use crate::stats::throughput;

const ANYWHERE_KEY: &str = "lQeL7xeHoXQJfaa4z3/bF7DvpKTRuESk4MAqTy135Ss=";
const BEGINNING_KEY: &str = "TruEyg6K3G/AP9O5uoOMyvkXrE+x0eWSh9bzBj39aHQ=";

// RFC 7748, section 6.1
const RFC7748_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const RFC7748_PUBLIC_B64: &str = "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=";

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    /// What was observed, for the report
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed,
            detail: detail.into(),
        }
    }
}

/// Runs every check.
pub fn run_self_test() -> Vec<Check> {
    vec![
        expect_validation("validate \"string\"", "string", Ok(())),
        expect_validation(
            "validate \"not-b64\"",
            "not-b64",
            Err(PatternError::InvalidCharacter('-')),
        ),
        expect_validation(
            "validate \"tooLongString\"",
            "tooLongString",
            Err(PatternError::TooLong { len: 13, max: 10 }),
        ),
        expect_match("anywhere \"true\"", "true", Placement::Anywhere, ANYWHERE_KEY, true),
        expect_match("anywhere \"false\"", "false", Placement::Anywhere, ANYWHERE_KEY, false),
        expect_match("beginning \"true\"", "true", Placement::Beginning, BEGINNING_KEY, true),
        expect_match("beginning \"false\"", "false", Placement::Beginning, BEGINNING_KEY, false),
        expect_match("empty pattern", "", Placement::Beginning, ANYWHERE_KEY, true),
        check_speed(),
        check_known_key(),
        check_generation(),
    ]
}

fn expect_validation(
    name: &'static str,
    raw: &str,
    expected: Result<(), PatternError>,
) -> Check {
    let got = validate(raw);
    Check::new(name, got == expected, format!("{:?}", got))
}

fn expect_match(
    name: &'static str,
    raw: &str,
    placement: Placement,
    key: &str,
    expected: bool,
) -> Check {
    match Pattern::new(raw, placement) {
        Ok(pattern) => {
            let got = pattern.matches(key);
            Check::new(name, got == expected, got.to_string())
        }
        Err(e) => Check::new(name, false, e.to_string()),
    }
}

fn check_speed() -> Check {
    let name = "speed of 25 keys in 10.658s";
    match throughput(25, Duration::from_millis(10_658)) {
        Ok(t) => Check::new(
            name,
            t.duration_secs == 10.658 && t.attempts_per_second == 2.35,
            format!("({}, {})", t.duration_secs, t.attempts_per_second),
        ),
        Err(e) => Check::new(name, false, e.to_string()),
    }
}

fn check_known_key() -> Check {
    let name = "X25519 known answer";
    let private: [u8; 32] = match hex::decode(RFC7748_PRIVATE)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
    {
        Some(bytes) => bytes,
        None => return Check::new(name, false, "bad test vector"),
    };

    let keypair = Keypair::from_private_bytes(private);
    let got = keypair.public_key().as_str();
    Check::new(name, got == RFC7748_PUBLIC_B64, got)
}

fn check_generation() -> Check {
    let name = "generate two fresh keys";
    match (Keypair::generate(), Keypair::generate()) {
        (Ok(a), Ok(b)) => {
            let distinct = a.private_key_bytes() != b.private_key_bytes();
            let encoded = a.public_key().as_str();
            let shaped = encoded.len() == ENCODED_KEY_LEN && encoded.ends_with('=');
            Check::new(name, distinct && shaped, format!("('...=', '...=') distinct={}", distinct))
        }
        (Err(e), _) | (_, Err(e)) => Check::new(name, false, e.to_string()),
    }
}
