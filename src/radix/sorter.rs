//! Recursive most-significant-byte radix sort over `Record`'s 10 key bytes: a
//! single-threaded counting + in-place swap pass (`ska_sort`) at each level, followed by
//! a parallel fan-out (`director`, via `arbitrary_chunks` + rayon) into the up-to-256
//! partitions that pass produced for the next level down. Falls back to a plain
//! comparison sort (`comparative_sort`) once a chunk is small, already sorted, or
//! homogeneous on the remaining levels.

use arbitrary_chunks::ArbitraryChunks;
use rayon::iter::{ParallelBridge, ParallelIterator};

use crate::radix::{
    comparative_sort::comparative_sort,
    radix_key::RadixKey,
    ska_sort::ska_sort_adapter,
    sort_utils::{get_counts, is_homogenous_bucket},
};
use crate::record::Record;

const COMPARATIVE_SORT_THRESHOLD: usize = 128;

fn handle_chunk(chunk: &mut [Record], level: usize) {
    if chunk.len() <= 1 {
        return;
    } else if chunk.len() <= COMPARATIVE_SORT_THRESHOLD {
        comparative_sort(chunk);
        return;
    }

    let (counts, already_sorted) = get_counts(chunk, level);

    if already_sorted || is_homogenous_bucket(&counts) {
        if level != 0 {
            director(chunk, &counts, level - 1);
        } else {
            // Homogeneous/already-sorted on the last key byte only proves the chunk's
            // keys are equal (or non-decreasing); it says nothing about value order,
            // so duplicate keys still need a real comparison pass (scenario S3).
            comparative_sort(chunk);
        }
        return;
    }

    ska_sort_adapter(chunk, &counts, level);
}

#[inline]
pub fn top_level_director(bucket: &mut [Record]) {
    let level = <Record as RadixKey>::LEVELS - 1;
    handle_chunk(bucket, level);
}

/// Splits `bucket` into the (up to 256) partitions `counts` describes, and processes
/// each one concurrently. `bucket` must already have been partitioned by `level + 1`'s
/// byte (i.e. `counts` is the histogram `ska_sort` just produced for that level).
#[inline]
pub fn director(bucket: &mut [Record], counts: &[usize; 256], level: usize) {
    bucket
        .arbitrary_chunks_mut(counts)
        .par_bridge()
        .for_each(|chunk| handle_chunk(chunk, level));
}

/// Sorts `data` by the full `Record` order (key, then value). Entry point used by
/// `LocalSorter` once a peer's inbox has been gathered.
pub fn sort(data: &mut [Record]) {
    if data.len() <= 1 {
        return;
    }
    top_level_director(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KEY_LEN;
    use rand::seq::SliceRandom;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rec(key: u8, value: u8) -> Record {
        let mut r = Record::zeroed();
        r.key = [key; KEY_LEN];
        r.value[0] = value;
        r
    }

    #[test]
    fn sorts_small_reversed_input() {
        // S2: 4 records with descending keys 04,03,02,01 -> ascending output.
        let mut data = vec![rec(4, 0), rec(3, 0), rec(2, 0), rec(1, 0)];
        sort(&mut data);
        let keys: Vec<u8> = data.iter().map(|r| r.key[0]).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
    }

    #[test]
    fn sorts_duplicates_by_value() {
        // S3: 6 records, identical keys, distinct values -> ascending by value.
        let mut data: Vec<Record> = (0..6).rev().map(|v| rec(2, v)).collect();
        sort(&mut data);
        let values: Vec<u8> = data.iter().map(|r| r.value[0]).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sorts_large_identical_key_chunk_by_value() {
        // Regression for the >COMPARATIVE_SORT_THRESHOLD duplicate-key case: the radix
        // descent is homogeneous at every level down to 0, so the only thing that can
        // break ties is a real comparison pass once that descent bottoms out.
        let mut data: Vec<Record> = (0..200u16).rev().map(|v| rec(2, v as u8)).collect();
        sort(&mut data);
        let values: Vec<u8> = data.iter().map(|r| r.value[0]).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sorts_a_large_shuffled_input() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut data: Vec<Record> = (0u32..50_000)
            .map(|i| {
                let mut r = Record::zeroed();
                let k = i.wrapping_mul(2654435761);
                r.key[..4].copy_from_slice(&k.to_be_bytes());
                r
            })
            .collect();
        data.shuffle(&mut rng);
        sort(&mut data);
        assert!(data.windows(2).all(|w| w[0] <= w[1]));
    }
}
