//! HTTP cache control module
//!
//! Provides `ETag` generation, conditional request handling and the
//! `Cache-Control` policy applied to static assets.

use sha2::{Digest, Sha256};

/// Generate a strong `ETag` from content
///
/// SHA-256 keeps the tag stable across builds and machines, so a
/// deployment written by one process validates in another.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"9f86d081884c7d65"`
pub fn generate_etag(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    format!("\"{}\"", hex::encode(&digest[..8]))
}

/// `ETag` of the gzip representation of an asset with tag `etag`
pub fn gzip_etag(etag: &str) -> String {
    let inner = etag.trim_matches('"');
    format!("\"{inner}-gzip\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak validators: `W/"abc123"` (weak comparison per RFC 9110)
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.trim_start_matches("W/") == etag
        })
    })
}

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Bare `max-age`, the header static assets carry
    MaxAge(u32),
    /// Revalidate on every use, chosen when `cache_max_age` is 0
    NoCache,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::MaxAge(max_age) => format!("max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
        }
    }

    /// Policy for a configured asset lifetime in seconds
    pub const fn for_max_age(max_age: u32) -> Self {
        if max_age == 0 {
            Self::NoCache
        } else {
            Self::MaxAge(max_age)
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::MaxAge(crate::config::DEFAULT_CACHE_MAX_AGE)
    }
}
