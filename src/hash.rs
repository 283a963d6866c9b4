//! Stable string hashing used for rollout and variant bucketing.
//!
//! The algorithm is the classic `h = h * 31 + code` over UTF-16 code units
//! with 32-bit two's-complement wrap-around, so any implementation that
//! follows it buckets callers identically.

/// Number of rollout buckets a caller can fall into.
pub const ROLLOUT_BUCKETS: u32 = 100;

/// Hash a string into a non-negative integer.
///
/// The one accumulated value without a positive counterpart, `i32::MIN`,
/// maps to `0`.
///
/// ```
/// use flag_evaluator::hash::stable_hash;
///
/// assert_eq!(stable_hash(""), 0);
/// assert_eq!(stable_hash("hello"), 99_162_322);
/// ```
pub fn stable_hash(input: &str) -> u32 {
    let h = input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));

    h.checked_abs().map_or(0, |abs| abs as u32)
}

/// Bucket in `0..100` for a caller identifier.
pub fn rollout_bucket(caller_id: &str) -> u32 {
    stable_hash(caller_id) % ROLLOUT_BUCKETS
}
