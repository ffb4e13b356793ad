//! A concrete, single-host implementation of the "shared-variable runtime" collaborator
//! from spec §9: barriers, broadcast, reduction, and asynchronous put/get, modeled as
//! named per-peer slots (`pivots`, `buckets`, `finishedSending`, per-peer run lengths).
//!
//! `LocalRuntime` runs every peer on its own OS thread and wires the slots together with
//! `crossbeam_channel` (for the gather-style slots: sample reduction, bucket shuffle) and
//! a shared `Mutex` + `Condvar` (for the broadcast-style slots: pivots, run lengths,
//! `finishedSending`). A real deployment would swap this module for a TCP-backed one
//! without the engine (`worker`, `sample`, `classify`, `shuffle`, `placement`) changing at
//! all — they only depend on the `PeerRuntime` trait below.

use crate::record::Record;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};

/// The contract every phase of the engine depends on. See spec §9 "Global state".
pub trait PeerRuntime: Send {
    fn id(&self) -> u32;
    fn peer_count(&self) -> u32;

    /// Blocks until every peer has called `barrier`.
    fn barrier(&self);

    /// Every peer submits its local sample list; peer 0 alone calls
    /// `reduce_samples_as_coordinator` to gather all of them.
    fn submit_samples(&self, samples: Vec<Record>);
    fn reduce_samples_as_coordinator(&self) -> Vec<Record>;

    /// Peer 0 publishes the pivot list; every peer (0 included) then calls `wait_pivots`
    /// to receive the identical, broadcast copy (invariant I1).
    fn publish_pivots(&self, pivots: Vec<Record>);
    fn wait_pivots(&self) -> Arc<Vec<Record>>;

    /// Batch shuffle: ship a whole sub-bucket to `target`'s inbox in one shipment, then
    /// drain exactly `expected_senders` shipments from this peer's own inbox.
    fn put_bucket(&self, target: u32, sub_bucket: Vec<Record>);
    fn take_inbox(&self, expected_senders: u32) -> Vec<Record>;

    /// Streamed shuffle: flush a partial chunk to `target`'s inbox as soon as it is
    /// full, any number of times, then signal completion and drain the set of
    /// everything received once every peer has signaled (spec: "the streamed shuffle's
    /// inbox therefore is a set, not a sequence").
    fn append_stream(&self, target: u32, chunk: Vec<Record>);
    fn signal_finished_sending(&self);
    fn take_streamed_inbox(&self, expected_senders: u32) -> Vec<Record>;

    /// All-to-all broadcast of each peer's sorted-run length, used by the shared-file
    /// placement variant to compute disjoint write offsets.
    fn broadcast_run_length(&self, my_len: u64) -> Vec<u64>;
}

struct BroadcastSlot<T> {
    values: Mutex<Vec<Option<T>>>,
    cv: Condvar,
}

impl<T: Clone> BroadcastSlot<T> {
    fn new(t: u32) -> Self {
        BroadcastSlot {
            values: Mutex::new(vec![None; t as usize]),
            cv: Condvar::new(),
        }
    }

    fn set(&self, id: u32, value: T) {
        let mut values = self.values.lock().unwrap();
        values[id as usize] = Some(value);
        self.cv.notify_all();
    }

    fn wait_all(&self, expected: u32) -> Vec<T> {
        let mut values = self.values.lock().unwrap();
        loop {
            let filled = values.iter().take(expected as usize).all(Option::is_some);
            if filled {
                return values[..expected as usize]
                    .iter()
                    .map(|v| v.clone().unwrap())
                    .collect();
            }
            values = self.cv.wait(values).unwrap();
        }
    }
}

struct Channels {
    bucket_tx: Vec<Sender<Vec<Record>>>,
    bucket_rx: Vec<Mutex<Option<Receiver<Vec<Record>>>>>,
    stream_tx: Vec<Sender<Vec<Record>>>,
    stream_rx: Vec<Mutex<Option<Receiver<Vec<Record>>>>>,
    sample_tx: Sender<Vec<Record>>,
    sample_rx: Mutex<Option<Receiver<Vec<Record>>>>,
}

struct SharedState {
    t: u32,
    barrier: std::sync::Barrier,
    channels: Channels,
    pivots: BroadcastSlot<Arc<Vec<Record>>>,
    run_lengths: BroadcastSlot<u64>,
    finished_sending: BroadcastSlot<()>,
}

/// A handle one peer thread uses to talk to the shared runtime.
pub struct LocalRuntime {
    id: u32,
    state: Arc<SharedState>,
}

/// Builds the shared state and one `LocalRuntime` handle per peer id `0..t`.
pub fn spawn_local_runtimes(t: u32) -> Vec<LocalRuntime> {
    assert!(t > 0);
    let mut bucket_tx = Vec::with_capacity(t as usize);
    let mut bucket_rx = Vec::with_capacity(t as usize);
    let mut stream_tx = Vec::with_capacity(t as usize);
    let mut stream_rx = Vec::with_capacity(t as usize);
    for _ in 0..t {
        let (tx, rx) = unbounded();
        bucket_tx.push(tx);
        bucket_rx.push(Mutex::new(Some(rx)));
        let (tx, rx) = unbounded();
        stream_tx.push(tx);
        stream_rx.push(Mutex::new(Some(rx)));
    }
    let (sample_tx, sample_rx) = unbounded();

    let state = Arc::new(SharedState {
        t,
        barrier: std::sync::Barrier::new(t as usize),
        channels: Channels {
            bucket_tx,
            bucket_rx,
            stream_tx,
            stream_rx,
            sample_tx,
            sample_rx: Mutex::new(Some(sample_rx)),
        },
        pivots: BroadcastSlot::new(t),
        run_lengths: BroadcastSlot::new(t),
        finished_sending: BroadcastSlot::new(t),
    });

    (0..t)
        .map(|id| LocalRuntime {
            id,
            state: state.clone(),
        })
        .collect()
}

impl PeerRuntime for LocalRuntime {
    fn id(&self) -> u32 {
        self.id
    }

    fn peer_count(&self) -> u32 {
        self.state.t
    }

    fn barrier(&self) {
        self.state.barrier.wait();
    }

    fn submit_samples(&self, samples: Vec<Record>) {
        self.state
            .channels
            .sample_tx
            .send(samples)
            .expect("sample channel closed");
    }

    fn reduce_samples_as_coordinator(&self) -> Vec<Record> {
        assert_eq!(self.id, 0, "only peer 0 coordinates sample reduction");
        let rx = self
            .state
            .channels
            .sample_rx
            .lock()
            .unwrap()
            .take()
            .expect("samples already reduced");
        let mut all = Vec::new();
        for _ in 0..self.state.t {
            all.extend(rx.recv().expect("sample sender dropped"));
        }
        all
    }

    fn publish_pivots(&self, pivots: Vec<Record>) {
        assert_eq!(self.id, 0, "only peer 0 publishes pivots");
        let shared = Arc::new(pivots);
        for peer in 0..self.state.t {
            self.state.pivots.set(peer, shared.clone());
        }
    }

    fn wait_pivots(&self) -> Arc<Vec<Record>> {
        self.state.pivots.wait_all(self.state.t)[self.id as usize].clone()
    }

    fn put_bucket(&self, target: u32, sub_bucket: Vec<Record>) {
        self.state.channels.bucket_tx[target as usize]
            .send(sub_bucket)
            .expect("bucket channel closed");
    }

    fn take_inbox(&self, expected_senders: u32) -> Vec<Record> {
        let rx = self.state.channels.bucket_rx[self.id as usize]
            .lock()
            .unwrap()
            .take()
            .expect("inbox already taken");
        let mut inbox = Vec::new();
        for _ in 0..expected_senders {
            inbox.extend(rx.recv().expect("bucket sender dropped"));
        }
        inbox
    }

    fn append_stream(&self, target: u32, chunk: Vec<Record>) {
        self.state.channels.stream_tx[target as usize]
            .send(chunk)
            .expect("stream channel closed");
    }

    fn signal_finished_sending(&self) {
        self.state.finished_sending.set(self.id, ());
    }

    fn take_streamed_inbox(&self, expected_senders: u32) -> Vec<Record> {
        // Every sender flushes (program-order-before) signaling finished, so once all
        // `expected_senders` signals are visible every flush they will ever send for
        // this target has already been enqueued; draining non-blockingly afterwards is
        // safe. The inbox is a set, so the order drained in does not matter.
        self.state.finished_sending.wait_all(expected_senders);
        let rx = self.state.channels.stream_rx[self.id as usize]
            .lock()
            .unwrap()
            .take()
            .expect("streamed inbox already taken");
        let mut inbox = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            inbox.extend(chunk);
        }
        inbox
    }

    fn broadcast_run_length(&self, my_len: u64) -> Vec<u64> {
        self.state.run_lengths.set(self.id, my_len);
        self.state.run_lengths.wait_all(self.state.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn barrier_releases_all_peers() {
        let runtimes = spawn_local_runtimes(4);
        let handles: Vec<_> = runtimes
            .into_iter()
            .map(|rt| thread::spawn(move || rt.barrier()))
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn pivot_broadcast_is_byte_identical_on_every_peer() {
        let runtimes = spawn_local_runtimes(3);
        let handles: Vec<_> = runtimes
            .into_iter()
            .map(|rt| {
                thread::spawn(move || {
                    if rt.id() == 0 {
                        let mut r = Record::zeroed();
                        r.key[0] = 5;
                        rt.publish_pivots(vec![r]);
                    }
                    rt.wait_pivots()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results {
            assert_eq!(r.len(), 1);
            assert_eq!(r[0].key[0], 5);
        }
    }

    #[test]
    fn run_length_broadcast_sees_every_peer() {
        let runtimes = spawn_local_runtimes(3);
        let handles: Vec<_> = runtimes
            .into_iter()
            .map(|rt| {
                let id = rt.id();
                thread::spawn(move || rt.broadcast_run_length(id as u64 + 1))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![1, 2, 3]);
        }
    }
}
