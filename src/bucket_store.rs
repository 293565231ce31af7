//! BucketStore: the power-of-two array of chain heads and the node arena
//! behind it.
//!
//! Nodes live in a `SlotMap`; chains are singly linked through
//! `Option<NodeKey>`, newest first. Each node keeps the digest it was
//! inserted with, so placement and rehashing never call back into the
//! payload contract.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub(crate) struct NodeKey;
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) payload: T,
    pub(crate) digest: u64,
    pub(crate) next: Option<NodeKey>,
}

/// Bucket index of `digest`: the top `exponent` bits of `seed * digest`.
///
/// The low bits of a multiplicative hash mix poorly, so they are dropped.
/// `exponent` is always in `1..=MAX_EXPONENT`, keeping the shift in range.
#[inline]
pub(crate) fn address(seed: u64, digest: u64, exponent: u32) -> usize {
    debug_assert!(exponent >= 1 && exponent < u64::BITS);
    (seed.wrapping_mul(digest) >> (u64::BITS - exponent)) as usize
}

/// Position of a node inside its chain, as found by `BucketStore::find`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Found {
    pub(crate) bucket: usize,
    pub(crate) prev: Option<NodeKey>,
    pub(crate) node: NodeKey,
}

#[derive(Debug)]
pub(crate) struct BucketStore<T> {
    pub(crate) exponent: u32,
    pub(crate) seed: u64,
    pub(crate) heads: Vec<Option<NodeKey>>,
    pub(crate) nodes: SlotMap<NodeKey, Node<T>>,
}

impl<T> BucketStore<T> {
    pub(crate) fn new(exponent: u32, seed: u64) -> Self {
        Self {
            exponent,
            seed,
            heads: vec![None; 1usize << exponent],
            nodes: SlotMap::with_key(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn slot(&self, digest: u64) -> usize {
        address(self.seed, digest, self.exponent)
    }

    /// Push a new node onto the front of the chain its digest maps to.
    pub(crate) fn push_front(&mut self, payload: T, digest: u64) {
        let bucket = self.slot(digest);
        let next = self.heads[bucket];
        let key = self.nodes.insert(Node {
            payload,
            digest,
            next,
        });
        self.heads[bucket] = Some(key);
    }

    /// First node in `digest`'s chain whose payload satisfies `matches`.
    pub(crate) fn find<F>(&self, digest: u64, mut matches: F) -> Option<Found>
    where
        F: FnMut(&T) -> bool,
    {
        let bucket = self.slot(digest);
        let mut prev = None;
        let mut cursor = self.heads[bucket];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            if node.digest == digest && matches(&node.payload) {
                return Some(Found {
                    bucket,
                    prev,
                    node: k,
                });
            }
            prev = Some(k);
            cursor = node.next;
        }
        None
    }

    pub(crate) fn payload(&self, k: NodeKey) -> &T {
        &self.nodes[k].payload
    }

    pub(crate) fn payload_mut(&mut self, k: NodeKey) -> &mut T {
        &mut self.nodes[k].payload
    }

    /// Unlink a located node from its chain and hand back its payload.
    pub(crate) fn unlink(&mut self, found: Found) -> T {
        let next = self.nodes[found.node].next;
        match found.prev {
            Some(p) => self.nodes[p].next = next,
            None => self.heads[found.bucket] = next,
        }
        // Invariant: `found` came from `find` on this store with no
        // mutation in between, so the key is live.
        match self.nodes.remove(found.node) {
            Some(node) => node.payload,
            None => unreachable!("located node vanished before unlink"),
        }
    }

    /// Drop every chain and restart at `exponent` with `seed`; the old
    /// payloads are returned in arena order.
    pub(crate) fn reset(&mut self, exponent: u32, seed: u64) -> impl Iterator<Item = T> {
        let nodes = core::mem::replace(&mut self.nodes, SlotMap::with_key());
        self.exponent = exponent;
        self.seed = seed;
        self.heads = vec![None; 1usize << exponent];
        nodes.into_iter().map(|(_, node)| node.payload)
    }

    pub(crate) fn chain(&self, bucket: usize) -> Chain<'_, T> {
        Chain {
            nodes: &self.nodes,
            cursor: self.heads[bucket],
        }
    }

    pub(crate) fn occupied_buckets(&self) -> usize {
        self.heads.iter().filter(|h| h.is_some()).count()
    }

    pub(crate) fn biggest_chain(&self) -> usize {
        (0..self.capacity())
            .map(|b| self.chain(b).count())
            .max()
            .unwrap_or(0)
    }

    /// Structural self-check used by tests: the array is `2^exponent` long,
    /// every node is reachable from exactly one chain, and sits in the
    /// bucket its digest maps to under the current seed.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        assert_eq!(self.heads.len(), 1usize << self.exponent);
        let mut seen = HashSet::new();
        for bucket in 0..self.capacity() {
            let mut cursor = self.heads[bucket];
            while let Some(k) = cursor {
                assert!(seen.insert(k), "node reachable twice");
                let node = self.nodes.get(k).expect("chain links a dead node");
                assert_eq!(self.slot(node.digest), bucket, "node in wrong bucket");
                cursor = node.next;
            }
        }
        assert_eq!(seen.len(), self.nodes.len(), "unreachable nodes in arena");
    }
}

/// Payloads of one chain, head first.
pub(crate) struct Chain<'a, T> {
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    cursor: Option<NodeKey>,
}

impl<'a, T> Iterator for Chain<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.payload)
    }
}
