//! Top-N reduction over frequency counters
//!
//! Two named modes:
//!
//! - **Exact**: rank one authoritative counter. Ties are broken by
//!   first-seen insertion order, which keeps results stable across runs.
//!   The streaming window path uses this, since a single global counter
//!   exists per snapshot.
//! - **Approximate merge**: each partition-local counter is first truncated
//!   to its `local_top_k` heaviest keys, then only the truncated counters
//!   are merged and the global top-N taken. This bounds merge cost at the
//!   price of long-tail accuracy: a word that is locally rare in every
//!   partition but globally frequent can be undercounted or missed
//!   entirely. `local_top_k` is a tunable; an unbounded K degenerates to
//!   exact behavior. This tradeoff is deliberate and covered by tests.

use crate::reviewstream::aggregate::FrequencyCounter;
use std::cmp::Reverse;

/// The `(word, count)` ranking produced by either reduction mode.
pub type RankedWords = Vec<(String, u64)>;

/// Exact top-N: the `n` highest-count keys of a single counter, descending,
/// ties broken by first-seen order.
pub fn top_n_exact(counter: &FrequencyCounter, n: usize) -> RankedWords {
    let mut ranked: Vec<(String, u64, u64)> = counter
        .entries_ordered()
        .into_iter()
        .enumerate()
        .map(|(seen, (key, count))| (key.to_string(), count, seen as u64))
        .collect();
    ranked.sort_by_key(|(_, count, seen)| (Reverse(*count), *seen));
    ranked
        .into_iter()
        .take(n)
        .map(|(key, count, _)| (key, count))
        .collect()
}

/// Truncate a counter to its `k` heaviest keys, preserving selection order.
///
/// This is the partition-local pre-filter of the approximate mode; the
/// discarded long tail never reaches the merge step.
pub fn local_top_k(counter: &FrequencyCounter, k: usize) -> FrequencyCounter {
    let mut truncated = FrequencyCounter::new();
    for (key, count) in top_n_exact(counter, k) {
        truncated.add(&key, count);
    }
    truncated
}

/// Approximate merge mode: merge the local top-K of every partition
/// counter, then take the global top-N of the merged result.
pub fn top_n_approximate(
    partitions: &[FrequencyCounter],
    n: usize,
    local_k: usize,
) -> RankedWords {
    let mut merged = FrequencyCounter::new();
    for partition in partitions {
        merged.merge(&local_top_k(partition, local_k));
    }
    top_n_exact(&merged, n)
}
