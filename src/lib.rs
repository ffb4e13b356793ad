//! Distributed sample-sort engine for fixed-length 100-byte records: a 10-byte key
//! followed by a 90-byte value. Each peer in the run samples its local slice of the
//! input, peer 0 reduces the samples into a shared pivot list, every peer classifies
//! its slice against those pivots, an all-to-all shuffle routes records to the peer
//! that owns their bucket, and each peer finishes by radix-sorting and placing its
//! share of the output.
//!
//! The module layout mirrors the pipeline: `partition_plan` and `sample` run before any
//! coordination happens, `runtime` is the coordination substrate everything else talks
//! to, `classify` and `shuffle` move records between peers, `radix` sorts what lands
//! locally, and `placement` writes it out. `worker` drives all of it phase by phase.

use std::time::Duration;

pub mod classify;
pub mod config;
pub mod error;
pub mod oracle;
pub mod partition_plan;
pub mod placement;
pub mod radix;
pub mod record;
pub mod record_io;
pub mod runtime;
pub mod sample;
pub mod shuffle;
pub mod worker;

/// A wrapper struct for `std::time::Duration` to provide pretty-printing of durations,
/// used when logging phase timings (spec §10.2).
#[doc(hidden)]
pub struct PrettyDuration(pub Duration);

impl std::fmt::Display for PrettyDuration {
    /// Durations are formatted as follows:
    /// - If the duration is greater than or equal to 1 second, it is formatted in seconds (s).
    /// - If the duration is greater than or equal to 1 millisecond but less than 1 second, it is formatted in milliseconds (ms).
    /// - If the duration is less than 1 millisecond, it is formatted in microseconds (µs).
    ///   In the case of seconds & milliseconds, the duration is always printed with a precision of two decimal places.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = self.0;
        if duration.as_secs() > 0 {
            let seconds =
                duration.as_secs() as f64 + f64::from(duration.subsec_nanos()) / 1_000_000_000.0;
            write!(f, "{seconds:.2}s ")
        } else if duration.subsec_millis() > 0 {
            let milliseconds =
                duration.as_millis() as f64 + f64::from(duration.subsec_micros() % 1_000) / 1_000.0;
            write!(f, "{milliseconds:.2}ms")
        } else {
            let microseconds = duration.as_micros();
            write!(f, "{microseconds}µs")
        }
    }
}
