//! Diagnostics: occupancy statistics and a printable bucket layout.

use crate::bucket_store::BucketStore;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Expected fraction of empty buckets when `items` digests land uniformly
/// in `buckets` buckets: `(1 - 1/buckets)^items`.
pub(crate) fn expected_empty_ratio(buckets: usize, items: usize) -> f64 {
    let b = buckets as f64;
    (1.0 - 1.0 / b).powf(items as f64)
}

/// Snapshot of a table's counters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stats {
    pub seed: u64,
    pub items: usize,
    pub buckets: usize,
    pub biggest_chain: usize,
    /// Fraction of buckets with a non-empty chain.
    pub occupied_ratio: f64,
    pub load_factor: f64,
}

impl Stats {
    pub(crate) fn collect<T>(store: &BucketStore<T>) -> Self {
        let buckets = store.capacity();
        let items = store.len();
        Self {
            seed: store.seed,
            items,
            buckets,
            biggest_chain: store.biggest_chain(),
            occupied_ratio: store.occupied_buckets() as f64 / buckets as f64,
            load_factor: items as f64 / buckets as f64,
        }
    }

    pub fn empty_ratio(&self) -> f64 {
        1.0 - self.occupied_ratio
    }

    pub fn expected_empty_ratio(&self) -> f64 {
        expected_empty_ratio(self.buckets, self.items)
    }

    pub fn expected_occupied_ratio(&self) -> f64 {
        1.0 - self.expected_empty_ratio()
    }
}

const RULE: &str = "——————————————————————————";

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = 100.0 * self.expected_empty_ratio();
        let empty = 100.0 * self.empty_ratio();
        writeln!(f, " * Hashtable Statistics *")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Seed         = {}", self.seed)?;
        writeln!(f, "#Items       = {}", self.items)?;
        writeln!(f, "#Buckets     = {}", self.buckets)?;
        writeln!(f, "BiggestChain = {}", self.biggest_chain)?;
        writeln!(f, "%Occupied    = {:.2}%", 100.0 * self.occupied_ratio)?;
        writeln!(
            f,
            "%Empty       = {:.2}% (Expected: {:.2}%, Diff = {:+.2}%)",
            empty,
            expected,
            empty - expected
        )?;
        writeln!(f, "LoadFactor   = {:.2}", self.load_factor)?;
        write!(f, "{RULE}")
    }
}

/// Bucket-by-bucket dump of a table, one line per bucket, chain in order.
pub struct Layout<'a, T> {
    pub(crate) store: &'a BucketStore<T>,
}

impl<T: fmt::Debug> fmt::Display for Layout<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " * Hashtable Content *")?;
        write!(f, "{RULE}")?;
        for bucket in 0..self.store.capacity() {
            write!(f, "\n{bucket}:")?;
            for payload in self.store.chain(bucket) {
                write!(f, "->({payload:?})")?;
            }
        }
        write!(f, "\n{RULE}")
    }
}
