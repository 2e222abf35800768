use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

const FINGERPRINT_LEN: usize = 12;

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^AIza[0-9A-Za-z_\-]{35}$").expect("key pattern compiles"))
}

/// Syntactic pre-filter for provider keys: `AIza` followed by exactly 35
/// characters of `[0-9A-Za-z_-]`. Never touches the network.
pub fn is_well_formed(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }

    key_pattern().is_match(token)
}

/// Strips whitespace and control characters picked up when a key is pasted.
pub fn normalize(token: &str) -> String {
    token
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Short stable identifier used in logs and reports in place of the key.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
