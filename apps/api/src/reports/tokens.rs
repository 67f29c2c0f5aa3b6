//! Report identifiers and access tokens.
//!
//! Both come straight from the OS CSPRNG and are drawn independently, so the
//! public id reveals nothing about the token that unlocks it.

use rand::{rngs::OsRng, RngCore};

pub const REPORT_ID_BYTES: usize = 12;
pub const ACCESS_TOKEN_BYTES: usize = 18;

/// 24 hex characters.
pub fn new_report_id() -> String {
    random_hex(REPORT_ID_BYTES)
}

/// 36 hex characters.
pub fn new_access_token() -> String {
    random_hex(ACCESS_TOKEN_BYTES)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time token comparison. Always compares all bytes regardless of
/// mismatch position; only the length check short-circuits.
pub fn tokens_match(stored: &str, supplied: &str) -> bool {
    let a = stored.as_bytes();
    let b = supplied.as_bytes();
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
