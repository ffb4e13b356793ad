//! `comparative_sort` is the fallback for chunks too small to be worth a radix pass.
//!
//! Unlike a generic radix-aware comparison sort that only compares the levels the
//! `RadixKey` trait exposes, this one sorts by the record's full `Ord` (key, then
//! value): once the director has recursed down through all 10 key-byte levels, every
//! record remaining in a chunk shares an identical key, and only a value comparison can
//! break the tie (scenario S3, duplicate keys).
//!
//! ## Characteristics
//!
//!  * in-place
//!  * unstable
//!  * single-threaded

use crate::record::Record;

pub(crate) fn comparative_sort(bucket: &mut [Record]) {
    if bucket.len() < 2 {
        return;
    }
    bucket.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KEY_LEN;

    #[test]
    fn breaks_ties_by_value_once_keys_match() {
        let mut a = Record::zeroed();
        a.key = [2; KEY_LEN];
        a.value[0] = 9;
        let mut b = Record::zeroed();
        b.key = [2; KEY_LEN];
        b.value[0] = 1;
        let mut bucket = vec![a, b];
        comparative_sort(&mut bucket);
        assert_eq!(bucket[0].value[0], 1);
        assert_eq!(bucket[1].value[0], 9);
    }
}
