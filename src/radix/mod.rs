//! A most-significant-byte radix sort specialized to `Record`, adapted from the
//! general-purpose `rdst`-style design at <https://github.com/nessex/rdst/>.

pub mod comparative_sort;
pub mod radix_key;
pub mod ska_sort;
pub mod sort_utils;
pub mod sorter;

