//! Resize engine: expand, collapse and same-size reseed, all built on one
//! in-place rehash.

use crate::bucket_store::{address, BucketStore, NodeKey};
use log::{debug, trace};

impl<T> BucketStore<T> {
    /// Double the bucket array, switch to `seed` and migrate every node.
    pub(crate) fn expand(&mut self, seed: u64) {
        let old_exponent = self.exponent;
        self.exponent += 1;
        self.seed = seed;
        self.heads.resize(1usize << self.exponent, None);
        let moved = self.rehash(old_exponent);
        debug!(
            "expanded to {} buckets for {} items ({} moved)",
            self.capacity(),
            self.len(),
            moved
        );
    }

    /// Halve the bucket array. Chains are migrated while the larger array is
    /// still in place, then the upper half (now empty) is released.
    pub(crate) fn collapse(&mut self, seed: u64) {
        let old_exponent = self.exponent;
        self.exponent -= 1;
        self.seed = seed;
        let moved = self.rehash(old_exponent);
        let capacity = 1usize << self.exponent;
        debug_assert!(self.heads[capacity..].iter().all(Option::is_none));
        self.heads.truncate(capacity);
        self.heads.shrink_to_fit();
        debug!(
            "collapsed to {} buckets for {} items ({} moved)",
            capacity,
            self.len(),
            moved
        );
    }

    /// Switch to `seed` without changing capacity. Returns the number of
    /// nodes that changed bucket.
    pub(crate) fn reseed(&mut self, seed: u64) -> usize {
        self.seed = seed;
        self.rehash(self.exponent)
    }

    /// Relocate every node reachable from the first `2^old_exponent` heads
    /// to the bucket its digest maps to under the current seed and exponent.
    ///
    /// Each chain is walked with an explicit cursor and trailing `prev`.
    /// A node whose target differs is spliced out and pushed onto the target
    /// head; otherwise it stays and becomes the new `prev`. A node pushed
    /// into a bucket not yet scanned is met again there, maps to the same
    /// bucket, and stays put, so every node is placed exactly once.
    fn rehash(&mut self, old_exponent: u32) -> usize {
        let mut moved = 0;
        for bucket in 0..(1usize << old_exponent) {
            let mut prev: Option<NodeKey> = None;
            let mut cursor = self.heads[bucket];
            while let Some(k) = cursor {
                let node = &self.nodes[k];
                let next = node.next;
                let target = address(self.seed, node.digest, self.exponent);
                if target != bucket {
                    match prev {
                        Some(p) => self.nodes[p].next = next,
                        None => self.heads[bucket] = next,
                    }
                    self.nodes[k].next = self.heads[target];
                    self.heads[target] = Some(k);
                    moved += 1;
                } else {
                    prev = Some(k);
                }
                cursor = next;
            }
        }
        trace!(
            "rehash 2^{} -> 2^{} buckets: {} of {} nodes moved",
            old_exponent,
            self.exponent,
            moved,
            self.len()
        );
        moved
    }
}
