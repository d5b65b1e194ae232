//! Standard competition ranking ("1224" ranking)
//!
//! Equal values share the rank of their first position in ascending order;
//! the next strictly larger value takes its own 1-based position, so ranks
//! may skip after a tie but are never dense.
//!
//! ```text
//! values: 5  5  5  9
//! ranks:  1  1  1  4
//! ```
//!
//! `NaN` orders above every number and ties with other `NaN`s, matching how
//! Postgres sorts `double precision`.

use std::cmp::Ordering;

/// A key with its value and 1-based competition rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<K> {
    /// Caller key (usually a dimension id)
    pub key: K,
    /// The ranked value
    pub value: f64,
    /// 1-based competition rank
    pub rank: usize,
}

/// Total ascending order over `f64` with every `NaN` equal and greatest.
///
/// Unlike [`f64::total_cmp`], `-0.0 == 0.0` and all `NaN` payloads tie.
#[must_use]
pub fn ascending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Rank `(key, value)` pairs by ascending value.
///
/// The output is in ascending value order; callers that need a lookup
/// should re-key by `key`. Keys are not checked for uniqueness here, see
/// [`crate::diff::validate_submission`].
///
/// # Examples
///
/// ```rust
/// use cwbench::rank::rank;
///
/// let ranked = rank(vec![("a", 5.0), ("b", 9.0), ("c", 5.0), ("d", 5.0)]);
/// let ranks: Vec<_> = ranked.iter().map(|r| (r.key, r.rank)).collect();
/// assert_eq!(ranks, vec![("a", 1), ("c", 1), ("d", 1), ("b", 4)]);
/// ```
#[must_use]
pub fn rank<K>(pairs: impl IntoIterator<Item = (K, f64)>) -> Vec<Ranked<K>> {
    let mut sorted: Vec<(K, f64)> = pairs.into_iter().collect();
    // Stable sort keeps ties in input order; their ranks are equal anyway
    sorted.sort_by(|a, b| ascending(a.1, b.1));

    let mut last_value = f64::NEG_INFINITY;
    let mut last_rank = 1;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            let position = index + 1;
            let rank = if ascending(value, last_value) == Ordering::Greater {
                last_value = value;
                last_rank = position;
                position
            } else {
                last_rank
            };
            Ranked { key, value, rank }
        })
        .collect()
}
