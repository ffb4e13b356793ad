//! Pivot sampling (spec §4.2): each peer contributes a share of leading records from its
//! slice; peer 0 reduces, dedups, sorts, and picks `T-1` (or fewer, in the degenerate
//! case) equally spaced pivots to broadcast.

use crate::record::Record;

/// How many samples peer `id` contributes toward a total of `total_samples` spread over
/// `t` peers: `⌈(S - id) / T⌉`, clamped to zero once `id >= total_samples` (peers beyond
/// the requested sample count contribute nothing).
#[inline]
pub fn sample_count(total_samples: u64, id: u32, t: u32) -> u64 {
    let numerator = total_samples as i64 - id as i64;
    if numerator <= 0 {
        return 0;
    }
    let t = t as i64;
    ((numerator + t - 1) / t) as u64
}

/// The leading `count` records of this peer's slice, in slice order. Cheap and
/// RNG-free; bias toward the head of each slice is tolerable because pivots only need to
/// approximately balance load (spec §4.2 rationale).
pub fn local_samples(slice: &[Record], count: u64) -> Vec<Record> {
    slice.iter().take(count as usize).copied().collect()
}

/// Peer-0-only reduction: dedup + sort the concatenation of every peer's samples, then
/// pick up to `T-1` equally spaced pivots.
///
/// Degenerate case (spec §4.2 "Failure"): once fewer than 2 distinct samples remain
/// after dedup, there is nothing to split on — the pivot list is empty and every record
/// routes to peer 0 (see `classify::lower_bound`, which returns bucket 0 for an empty
/// pivot list regardless of the record).
pub fn select_pivots(mut samples: Vec<Record>, t: u32) -> Vec<Record> {
    samples.sort_unstable();
    samples.dedup();
    let p = samples.len();
    if p <= 1 {
        return Vec::new();
    }
    let pivot_count = (t as usize).min(p).saturating_sub(1);
    let stride = (p / t as usize).max(1);
    (1..=pivot_count)
        .map(|i| samples[(i * stride).min(p - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KEY_LEN;

    fn rec(key: u8) -> Record {
        let mut r = Record::zeroed();
        r.key = [key; KEY_LEN];
        r
    }

    #[test]
    fn sample_count_sums_to_total_when_enough_peers() {
        let t = 4;
        let total = 10;
        let sum: u64 = (0..t).map(|id| sample_count(total, id, t)).sum();
        assert!(sum >= total);
    }

    #[test]
    fn sample_count_is_zero_past_total() {
        assert_eq!(sample_count(1, 5, 8), 0);
    }

    #[test]
    fn degenerate_dedup_to_one_or_zero_yields_empty_pivots() {
        assert_eq!(select_pivots(vec![], 8), Vec::new());
        assert_eq!(select_pivots(vec![rec(2)], 8), Vec::new());
        assert_eq!(select_pivots(vec![rec(2), rec(2), rec(2)], 3).len(), 0);
    }

    #[test]
    fn two_distinct_samples_yield_exactly_one_pivot() {
        let samples = vec![rec(1), rec(9)];
        let pivots = select_pivots(samples, 8);
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].key[0], 9);
    }

    #[test]
    fn pivot_count_never_exceeds_t_minus_one() {
        let samples: Vec<Record> = (0..50).map(rec).collect();
        let pivots = select_pivots(samples, 4);
        assert_eq!(pivots.len(), 3);
    }
}
