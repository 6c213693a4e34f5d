//! Statistics helpers shared by both stores.

/// Fraction of lookups that were hits, in `0.0..=1.0`.
///
/// Returns `0.0` when no lookups have happened yet.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
