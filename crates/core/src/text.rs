//! Small text utilities: slug derivation and content hashing.

use sha2::{Digest, Sha256};

/// Derive a URL-safe, `snake_case` slug from arbitrary text.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single `_`, strips leading/trailing separators, and truncates to 80
/// characters. Used to derive machine-readable error codes from human
/// messages when no explicit code is supplied.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
        if out.len() >= 80 {
            break;
        }
    }

    out.truncate(80);
    out
}

/// Hex-encoded SHA-256 digest of the input, used for consent audit records
/// (the raw email never reaches the consent table).
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
