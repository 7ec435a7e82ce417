//! Shared helpers: wall-clock time, day arithmetic and product key formatting.

use axum::http::HeaderMap;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::Utc;
use rand::Rng;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Alphabet for product keys: uppercase, without 0/O and 1/I.
const KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const KEY_GROUPS: usize = 4;
const KEY_GROUP_LEN: usize = 4;

/// Current time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn days_to_millis(days: i64) -> i64 {
    days * MILLIS_PER_DAY
}

/// Whole days left until `end`, rounded up.
///
/// Returns `None` when there is no end, and `Some(0)` once it has passed.
pub fn days_remaining(end: Option<i64>, now: i64) -> Option<i64> {
    let end = end?;
    let left = end - now;
    if left <= 0 {
        return Some(0);
    }
    Some((left + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
}

/// Generate a product key in XXXX-XXXX-XXXX-XXXX format.
pub fn generate_product_key() -> String {
    let mut rng = rand::thread_rng();
    let groups: Vec<String> = (0..KEY_GROUPS)
        .map(|_| {
            (0..KEY_GROUP_LEN)
                .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
                .collect()
        })
        .collect();
    groups.join("-")
}

/// Trim and uppercase user input, returning it only if it has the product key shape.
///
/// The check is on shape (`[A-Z0-9]{4}` groups), not alphabet, so keys issued
/// by older generators are still accepted.
pub fn normalize_product_key(input: &str) -> Option<String> {
    let key = input.trim().to_uppercase();
    let groups: Vec<&str> = key.split('-').collect();
    let well_formed = groups.len() == KEY_GROUPS
        && groups.iter().all(|g| {
            g.len() == KEY_GROUP_LEN && g.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        });
    well_formed.then_some(key)
}

/// Hide the middle groups of a key: `ABCD-****-****-WXYZ`.
pub fn mask_product_key(key: &str) -> String {
    let groups: Vec<&str> = key.split('-').collect();
    match groups.as_slice() {
        [first, middle @ .., last] if !middle.is_empty() => {
            let hidden: Vec<String> = middle.iter().map(|g| "*".repeat(g.len())).collect();
            format!("{}-{}-{}", first, hidden.join("-"), last)
        }
        _ => "*".repeat(key.len()),
    }
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns None if the header is missing, malformed, or empty.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|s| !s.is_empty())
}
