//! All-to-all shuffle (spec §4.4): deliver sub-bucket `i`, from every peer, to peer `i`.
//! Two interchangeable transports over the same `PeerRuntime` contract.

use crate::record::Record;
use crate::runtime::PeerRuntime;

/// Every one of the `t` peers classifies its own slice into `bucket_count` buckets and
/// ships all of them (possibly empty) to their target, so a target that is in range
/// always hears from all `t` peers. A peer with `id >= bucket_count` is never a target
/// at all — no sub-bucket vector that size ever has an entry for it — so it must skip
/// waiting entirely rather than block on shipments that will never arrive (spec §9
/// "Open questions", second bullet).
pub fn expected_sender_count(t: u32) -> u32 {
    t
}

/// Batch shuffle (spec §4.4): ship each sub-bucket once, wait for one shipment from
/// every peer.
pub fn batch_shuffle(
    runtime: &dyn PeerRuntime,
    sub_buckets: Vec<Vec<Record>>,
    bucket_count: usize,
) -> Vec<Record> {
    let id = runtime.id();
    // Local delivery (target == id) still goes through the inbox so `take_inbox`'s
    // expected count, which includes self, stays uniform across senders.
    for (target, sub_bucket) in sub_buckets.into_iter().enumerate() {
        runtime.put_bucket(target as u32, sub_bucket);
    }
    if (id as usize) < bucket_count {
        runtime.take_inbox(expected_sender_count(runtime.peer_count()))
    } else {
        Vec::new()
    }
}

/// Streamed shuffle (spec §4.4): flush each sub-bucket to its target as soon as it
/// reaches `flush_threshold`, overlapping transmission with ongoing classification.
/// Call `flush_remaining` once classification is done to ship whatever is left, then
/// `finish` to signal completion and collect the inbox.
pub struct StreamedShuffle<'a> {
    runtime: &'a dyn PeerRuntime,
    flush_threshold: usize,
    bucket_count: usize,
}

impl<'a> StreamedShuffle<'a> {
    pub fn new(runtime: &'a dyn PeerRuntime, flush_threshold: usize, bucket_count: usize) -> Self {
        StreamedShuffle {
            runtime,
            flush_threshold: flush_threshold.max(1),
            bucket_count,
        }
    }

    /// Flushes `sub_bucket` to `target` if it has reached the threshold, leaving it
    /// otherwise untouched. Call this after every append during classification.
    pub fn maybe_flush(&self, target: u32, sub_bucket: &mut Vec<Record>) {
        if sub_bucket.len() >= self.flush_threshold {
            self.flush(target, sub_bucket);
        }
    }

    pub fn flush(&self, target: u32, sub_bucket: &mut Vec<Record>) {
        if sub_bucket.is_empty() {
            return;
        }
        let chunk = std::mem::take(sub_bucket);
        self.runtime.append_stream(target, chunk);
    }

    pub fn flush_remaining(&self, sub_buckets: &mut [Vec<Record>]) {
        for (target, sub_bucket) in sub_buckets.iter_mut().enumerate() {
            self.flush(target as u32, sub_bucket);
        }
    }

    pub fn finish(self) -> Vec<Record> {
        self.runtime.signal_finished_sending();
        let expected = expected_sender_count(self.runtime.peer_count());
        if (self.runtime.id() as usize) < self.bucket_count {
            self.runtime.take_streamed_inbox(expected)
        } else {
            // Idle peers still must not block the others on their own finished signal.
            self.runtime.take_streamed_inbox(expected);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KEY_LEN;
    use crate::runtime::spawn_local_runtimes;
    use std::thread;

    fn rec(key: u8) -> Record {
        let mut r = Record::zeroed();
        r.key = [key; KEY_LEN];
        r
    }

    #[test]
    fn batch_shuffle_delivers_every_sub_bucket_to_its_target() {
        let runtimes = spawn_local_runtimes(3);
        let handles: Vec<_> = runtimes
            .into_iter()
            .map(|rt| {
                thread::spawn(move || {
                    let id = rt.id();
                    // Each peer sends record `id` to bucket `id` (itself), so the
                    // result should be a one-record inbox containing `rec(id)`.
                    let mut sub_buckets = vec![Vec::new(); 3];
                    sub_buckets[id as usize].push(rec(id as u8));
                    batch_shuffle(&rt, sub_buckets, 3)
                })
            })
            .collect();
        for (id, h) in handles.into_iter().enumerate() {
            let inbox = h.join().unwrap();
            assert_eq!(inbox.len(), 1);
            assert_eq!(inbox[0].key[0], id as u8);
        }
    }

    #[test]
    fn streamed_shuffle_collects_flushed_chunks_as_a_set() {
        let runtimes = spawn_local_runtimes(2);
        let handles: Vec<_> = runtimes
            .into_iter()
            .map(|rt| {
                thread::spawn(move || {
                    let id = rt.id();
                    let flusher = StreamedShuffle::new(&rt, 1, 2);
                    let mut sub_buckets = vec![Vec::new(); 2];
                    sub_buckets[0].push(rec(id as u8));
                    flusher.maybe_flush(0, &mut sub_buckets[0]);
                    flusher.flush_remaining(&mut sub_buckets);
                    flusher.finish()
                })
            })
            .collect();
        let mut results: Vec<Vec<Record>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        // Peer 0 is the target of bucket 0; it should see both peers' contributions.
        let mut keys: Vec<u8> = results.remove(0).iter().map(|r| r.key[0]).collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1]);
    }
}
