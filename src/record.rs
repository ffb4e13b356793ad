//! The fixed-length record this engine sorts: a 10-byte key followed by a 90-byte value.

use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;

/// Bytes in a key.
pub const KEY_LEN: usize = 10;
/// Bytes in a value.
pub const VALUE_LEN: usize = 90;
/// Total record length on the wire and on disk.
pub const RECORD_LEN: usize = KEY_LEN + VALUE_LEN;

/// One 100-byte record: `key[0..10]` + `value[10..100]`.
///
/// `Pod`/`Zeroable` let a `&[u8]` window of a memory-mapped file be reinterpreted as
/// `&[Record]` without a copy.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Record {
    pub key: [u8; KEY_LEN],
    pub value: [u8; VALUE_LEN],
}

impl Record {
    pub const LEN: usize = RECORD_LEN;

    pub fn zeroed() -> Self {
        Zeroable::zeroed()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), RECORD_LEN, "record slice must be 100 bytes");
        let mut r = Record::zeroed();
        r.key.copy_from_slice(&bytes[..KEY_LEN]);
        r.value.copy_from_slice(&bytes[KEY_LEN..]);
        r
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Unsigned byte-lexicographic key comparison, as a standalone operation: this is
    /// what the classifier's `lower_bound` runs against the pivot list.
    #[inline(always)]
    pub fn key_cmp(&self, other: &Record) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}
impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    /// Full record order: key first, value breaks ties. This is the order `P2 Global
    /// order` is checked against, and the only order the final radix-sort leaf fallback
    /// needs once two records share all 10 key bytes (scenario S3).
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Equal => self.value.cmp(&other.value),
            ord => ord,
        }
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Record(key=")?;
        for b in &self.key {
            write!(f, "{b:02x}")?;
        }
        write!(f, ", value=")?;
        for b in &self.value[..8.min(self.value.len())] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "…)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_breaks_ties_to_value() {
        let mut a = Record::zeroed();
        a.key = [2; KEY_LEN];
        a.value[0] = 1;
        let mut b = Record::zeroed();
        b.key = [2; KEY_LEN];
        b.value[0] = 2;
        assert!(a < b);
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut r = Record::zeroed();
        r.key = [9; KEY_LEN];
        r.value[5] = 7;
        let bytes = r.as_bytes().to_vec();
        let r2 = Record::from_bytes(&bytes);
        assert_eq!(r, r2);
    }
}
