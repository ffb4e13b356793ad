//! Classification (spec §4.3): route each record to the bucket of the peer that owns
//! its key range, by binary-searching the broadcast pivot list.

use crate::record::Record;
use crate::runtime::PeerRuntime;
use crate::shuffle::StreamedShuffle;
use rayon::prelude::*;
use thread_local::ThreadLocal;

/// Smallest index `b` such that `record < pivots[b]`, or `pivots.len()` if no such index
/// exists. Records equal to a pivot go to the *higher* bucket (`<` rather than `<=`),
/// which is what makes this policy globally consistent across peers that all hold the
/// byte-identical pivot list (invariant I3, scenario S6).
#[inline]
pub fn lower_bound(pivots: &[Record], record: &Record) -> usize {
    pivots.partition_point(|p| *p <= *record)
}

/// Splits `slice` into `bucket_count` sub-buckets (one per target peer) by classifying
/// every record against `pivots`. `bucket_count` is normally `pivots.len() + 1`; pass it
/// explicitly so peers with no assigned bucket (more peers than buckets, spec §3) still
/// get correctly empty sub-buckets instead of panicking on an out-of-range target.
///
/// Runs the per-chunk classification in parallel (rayon), each worker thread
/// accumulating into its own scratch buckets before a final merge, avoiding
/// cross-thread contention on a shared bucket vector.
pub fn classify(slice: &[Record], pivots: &[Record], bucket_count: usize) -> Vec<Vec<Record>> {
    if slice.is_empty() {
        return vec![Vec::new(); bucket_count];
    }

    let chunk_size = (slice.len() / rayon::current_num_threads().max(1)).max(1);
    let scratch: ThreadLocal<std::cell::RefCell<Vec<Vec<Record>>>> = ThreadLocal::new();

    slice.par_chunks(chunk_size).for_each(|chunk| {
        let cell = scratch.get_or(|| std::cell::RefCell::new(vec![Vec::new(); bucket_count]));
        let mut local = cell.borrow_mut();
        for record in chunk {
            let bucket = lower_bound(pivots, record).min(bucket_count - 1);
            local[bucket].push(*record);
        }
    });

    let mut merged = vec![Vec::new(); bucket_count];
    for cell in scratch.into_iter() {
        let local = cell.into_inner();
        for (b, mut records) in local.into_iter().enumerate() {
            merged[b].append(&mut records);
        }
    }
    merged
}

/// Classifies `slice` one record at a time, shipping each sub-bucket to its target as
/// soon as it reaches `flush_threshold` records (spec §4.3/§4.4 combined: the streamed
/// shuffle transport). Unlike `classify`, this walks `slice` on a single thread so each
/// append can be followed immediately by a `maybe_flush` check, which is what lets
/// transmission of an early sub-bucket overlap with classification of later records
/// instead of waiting for the whole slice to be classified first.
pub fn classify_streamed(
    runtime: &dyn PeerRuntime,
    slice: &[Record],
    pivots: &[Record],
    bucket_count: usize,
    flush_threshold: usize,
) -> Vec<Record> {
    let flusher = StreamedShuffle::new(runtime, flush_threshold, bucket_count);
    let mut sub_buckets: Vec<Vec<Record>> = vec![Vec::new(); bucket_count];

    for record in slice {
        let bucket = lower_bound(pivots, record).min(bucket_count - 1);
        sub_buckets[bucket].push(*record);
        flusher.maybe_flush(bucket as u32, &mut sub_buckets[bucket]);
    }

    flusher.flush_remaining(&mut sub_buckets);
    flusher.finish()
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
    fn empty_pivot_list_routes_everything_to_bucket_zero() {
        let records = vec![rec(1), rec(9), rec(5)];
        let buckets = classify(&records, &[], 1);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].len(), 3);
    }

    #[test]
    fn boundary_equality_routes_to_higher_bucket() {
        // S6: pivots=[k5], records {k5, k5, k5} all land in bucket 1.
        let pivots = vec![rec(5)];
        let records = vec![rec(5), rec(5), rec(5)];
        let buckets = classify(&records, &pivots, pivots.len() + 1);
        assert_eq!(buckets[0].len(), 0);
        assert_eq!(buckets[1].len(), 3);
    }

    #[test]
    fn records_route_to_their_key_range() {
        let pivots = vec![rec(3), rec(6)];
        let records = vec![rec(1), rec(3), rec(4), rec(6), rec(9)];
        let buckets = classify(&records, &pivots, pivots.len() + 1);
        // bucket 0: < 3 -> {1}
        // bucket 1: 3 <= x < 6 -> {3, 4}
        // bucket 2: >= 6 -> {6, 9}
        assert_eq!(buckets[0].iter().map(|r| r.key[0]).collect::<Vec<_>>(), vec![1]);
        assert_eq!(buckets[1].iter().map(|r| r.key[0]).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(buckets[2].iter().map(|r| r.key[0]).collect::<Vec<_>>(), vec![6, 9]);
    }

    #[test]
    fn idle_peer_bucket_count_yields_empty_extra_buckets() {
        // S5: fewer assigned buckets than peers; excess buckets must exist and be empty.
        let pivots = vec![rec(5)];
        let records = vec![rec(1), rec(9)];
        let buckets = classify(&records, &pivots, 8);
        assert_eq!(buckets.len(), 8);
        assert!(buckets[2..].iter().all(Vec::is_empty));
    }

    #[test]
    fn classify_streamed_agrees_with_classify_in_aggregate() {
        use crate::runtime::spawn_local_runtimes;
        use std::thread;

        let pivots = vec![rec(5)];
        let locals = vec![vec![rec(1), rec(5), rec(9)], vec![rec(2), rec(6)]];
        let runtimes = spawn_local_runtimes(2);
        let handles: Vec<_> = runtimes
            .into_iter()
            .zip(locals)
            .map(|(rt, local)| {
                let pivots = pivots.clone();
                thread::spawn(move || classify_streamed(&rt, &local, &pivots, 1, 2))
            })
            .collect();

        // Only peer 0 owns a bucket here (bucket_count == 1); peer 1 is idle and must
        // finish with an empty result instead of blocking.
        let mut results: Vec<Vec<Record>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let mut keys: Vec<u8> = results.remove(0).iter().map(|r| r.key[0]).collect();
        keys.sort();
        assert_eq!(keys, vec![1, 2, 5, 6, 9]);
        assert!(results[0].is_empty());
    }
}
