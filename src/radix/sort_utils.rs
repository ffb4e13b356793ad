//! Byte-histogram helpers shared by the radix sort passes: prefix sums, end offsets,
//! and per-chunk counting (with a cheap already-sorted detector so fully- or
//! mostly-sorted runs skip the swap pass entirely).

use crate::radix::radix_key::RadixKey;

#[inline]
pub fn get_prefix_sums(counts: &[usize; 256]) -> [usize; 256] {
    let mut sums = [0usize; 256];
    let mut running_total = 0;
    for (i, c) in counts.iter().enumerate() {
        sums[i] = running_total;
        running_total += c;
    }
    sums
}

#[inline]
pub fn get_end_offsets(counts: &[usize; 256], prefix_sums: &[usize; 256]) -> [usize; 256] {
    let mut end_offsets = [0usize; 256];
    end_offsets[0..255].copy_from_slice(&prefix_sums[1..256]);
    end_offsets[255] = counts[255] + prefix_sums[255];
    end_offsets
}

/// Counts how many items fall into each of the 256 buckets at `level`, and reports
/// whether the chunk was already non-decreasing on that level (in which case the swap
/// pass can be skipped and the director can recurse straight into the next level).
#[inline]
pub fn get_counts<T>(bucket: &[T], level: usize) -> ([usize; 256], bool)
where
    T: RadixKey,
{
    let mut counts = [0usize; 256];
    let mut already_sorted = true;
    let mut last = 0usize;
    for item in bucket {
        let b = item.get_level(level) as usize;
        counts[b] += 1;
        if b < last {
            already_sorted = false;
        }
        last = b;
    }
    (counts, already_sorted)
}

#[inline]
pub fn is_homogenous_bucket(counts: &[usize; 256]) -> bool {
    let mut seen = false;
    for c in counts {
        if *c > 0 {
            if seen {
                return false;
            }
            seen = true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, KEY_LEN};

    fn rec(key: u8) -> Record {
        let mut r = Record::zeroed();
        r.key = [key; KEY_LEN];
        r
    }

    #[test]
    fn detects_already_sorted_runs() {
        let sorted = vec![rec(0), rec(0), rec(1), rec(2)];
        let (_, already_sorted) = get_counts(&sorted, 9);
        assert!(already_sorted);

        let unsorted = vec![rec(0), rec(5), rec(2)];
        let (_, already_sorted) = get_counts(&unsorted, 9);
        assert!(!already_sorted);
    }

    #[test]
    fn prefix_sums_and_end_offsets_partition_the_bucket() {
        let mut counts = [0usize; 256];
        counts[0] = 2;
        counts[5] = 3;
        let sums = get_prefix_sums(&counts);
        let ends = get_end_offsets(&counts, &sums);
        assert_eq!(sums[0], 0);
        assert_eq!(ends[0], 2);
        assert_eq!(sums[5], 2);
        assert_eq!(ends[5], 5);
    }

    #[test]
    fn homogenous_bucket_detection() {
        let mut counts = [0usize; 256];
        counts[7] = 10;
        assert!(is_homogenous_bucket(&counts));
        counts[9] = 1;
        assert!(!is_homogenous_bucket(&counts));
    }
}
