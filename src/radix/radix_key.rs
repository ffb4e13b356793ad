//! The byte-at-a-level view the radix sorter needs. Mirrors the `rdst`-style
//! `RadixKey` trait: `LEVELS` bytes are inspected from the most significant (`level ==
//! LEVELS - 1`) down to the least significant (`level == 0`).

use crate::record::{Record, KEY_LEN};

pub trait RadixKey {
    const LEVELS: usize;
    fn get_level(&self, level: usize) -> u8;
}

impl RadixKey for Record {
    // One level per key byte; the 90-byte value never participates in the radix
    // passes. Once a chunk has been fully partitioned on all 10 key bytes, every
    // record left in it shares an identical key and the comparison fallback in
    // `comparative_sort` breaks the remaining ties on the value (scenario S3).
    const LEVELS: usize = KEY_LEN;

    #[inline(always)]
    fn get_level(&self, level: usize) -> u8 {
        self.key[Self::LEVELS - 1 - level]
    }
}
