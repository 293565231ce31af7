//! ChainedTable: the public table. Orchestrates the payload contract, the
//! seed source and the bucket store, and enforces the load-factor bounds
//! around every mutation.

use crate::bucket_store::{BucketStore, Found, Node, NodeKey};
use crate::config::{ConfigError, TableConfig, DEFAULT_CAPACITY, MAX_EXPONENT};
use crate::contract::{FnContract, PayloadContract, StdContract};
use crate::seed::{entropy_source, DefaultSeedSource, SeedSource};
use crate::stats::{expected_empty_ratio, Layout, Stats};
use core::fmt;
use core::hash::Hash;
use log::debug;
use slotmap::SlotMap;

/// Expand once `items / capacity` reaches this value.
const MAX_LOAD_FACTOR: usize = 1;

/// Result of [`ChainedTable::optimize`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OptimizeOutcome {
    /// Re-seed passes performed.
    pub rounds: u32,
    /// Whether occupancy reached the expected level within the round cap.
    pub converged: bool,
}

pub struct ChainedTable<T, C, R = DefaultSeedSource> {
    store: BucketStore<T>,
    contract: C,
    seeds: R,
    config: TableConfig,
}

impl<T, H, E> ChainedTable<T, FnContract<H, E>>
where
    H: Fn(&T) -> u64,
    E: Fn(&T, &T) -> bool,
{
    /// Table over closures, starting at the default capacity.
    pub fn init(hash: H, equal: E) -> Self {
        Self::init_size(hash, equal, DEFAULT_CAPACITY)
    }

    /// Table over closures with `init_capacity` rounded up to a power of two
    /// (minimum 2).
    ///
    /// Panics if the rounded capacity does not fit the address space.
    pub fn init_size(hash: H, equal: E, init_capacity: usize) -> Self {
        Self::with_parts(
            FnContract::new(hash, equal),
            entropy_source(),
            TableConfig::new().initial_capacity(init_capacity),
        )
    }
}

impl<T> ChainedTable<T, StdContract>
where
    T: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_contract(StdContract::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_parts(
            StdContract::new(),
            entropy_source(),
            TableConfig::new().initial_capacity(capacity),
        )
    }
}

impl<T> Default for ChainedTable<T, StdContract>
where
    T: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> ChainedTable<T, C>
where
    C: PayloadContract<T>,
{
    pub fn with_contract(contract: C) -> Self {
        Self::with_parts(contract, entropy_source(), TableConfig::default())
    }
}

impl<T, C, R> ChainedTable<T, C, R>
where
    C: PayloadContract<T>,
    R: SeedSource,
{
    /// Build a table from an explicit contract, seed source and config.
    ///
    /// Panics if `config` does not validate; see [`Self::try_with_parts`].
    pub fn with_parts(contract: C, seeds: R, config: TableConfig) -> Self {
        match Self::try_with_parts(contract, seeds, config) {
            Ok(table) => table,
            Err(e) => panic!("invalid table config: {e}"),
        }
    }

    pub fn try_with_parts(
        contract: C,
        mut seeds: R,
        config: TableConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let exponent = config.initial_exponent()?;
        let store = BucketStore::new(exponent, seeds.next_seed());
        debug!(
            "new table: {} buckets, floor {}",
            store.capacity(),
            1usize << config.min_exponent
        );
        Ok(Self {
            store,
            contract,
            seeds,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Number of buckets; always `2^exponent()`.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn exponent(&self) -> u32 {
        self.store.exponent
    }

    /// Current addressing seed. Changes on every resize and optimize pass.
    pub fn seed(&self) -> u64 {
        self.store.seed
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Add `payload`. Equal payloads are not merged: inserting twice stores
    /// two entries, and deduplication is up to the caller.
    pub fn insert(&mut self, payload: T) {
        if self.store.len() / self.store.capacity() >= MAX_LOAD_FACTOR
            && self.store.exponent < MAX_EXPONENT
        {
            self.store.expand(self.seeds.next_seed());
        }
        let digest = self.contract.hash(&payload);
        self.store.push_front(payload, digest);
    }

    /// First stored payload equal to `key` in chain order. Chains are newest
    /// first on insert; a rehash may reorder equal payloads.
    pub fn query(&self, key: &T) -> Option<&T> {
        let found = self.locate(key)?;
        Some(self.store.payload(found.node))
    }

    /// Mutable access to the first payload equal to `key`. The fields that
    /// feed the contract's hash and equality must not change through it.
    pub fn query_mut(&mut self, key: &T) -> Option<&mut T> {
        let found = self.locate(key)?;
        Some(self.store.payload_mut(found.node))
    }

    pub fn contains(&self, key: &T) -> bool {
        self.query(key).is_some()
    }

    /// Unlink the first payload equal to `key` and return it. Shrinks the
    /// table afterwards if the load factor fell to a quarter or less.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let found = self.locate(key)?;
        let payload = self.store.unlink(found);
        if self.store.exponent > self.config.min_exponent
            && self.store.len().saturating_mul(4) <= self.store.capacity() * MAX_LOAD_FACTOR
        {
            self.store.collapse(self.seeds.next_seed());
        }
        Some(payload)
    }

    /// Remove the first payload equal to `key` and pass it to `destroy`.
    /// Returns whether anything was removed; `destroy` runs exactly once
    /// in that case and never otherwise.
    pub fn delete<F>(&mut self, key: &T, destroy: F) -> bool
    where
        F: FnOnce(T),
    {
        match self.remove(key) {
            Some(payload) => {
                destroy(payload);
                true
            }
            None => false,
        }
    }

    /// Remove every payload, handing each to `destroy`, and shrink back to
    /// the floor capacity. Returns the number of payloads drained.
    pub fn drain<F>(&mut self, mut destroy: F) -> usize
    where
        F: FnMut(T),
    {
        let seed = self.seeds.next_seed();
        let payloads: Vec<T> = self.store.reset(self.config.min_exponent, seed).collect();
        let n = payloads.len();
        payloads.into_iter().for_each(&mut destroy);
        debug!("drained {} items", n);
        n
    }

    /// Re-seed and rehash at the current capacity until the share of empty
    /// buckets is no worse than uniform hashing predicts, within the
    /// configured tolerance and round cap.
    pub fn optimize(&mut self) -> OptimizeOutcome {
        let mut rounds = 0;
        let converged = loop {
            let empty = 1.0 - self.store.occupied_buckets() as f64 / self.store.capacity() as f64;
            let excess = empty - expected_empty_ratio(self.store.capacity(), self.store.len());
            if excess <= self.config.optimize_tolerance {
                break true;
            }
            if rounds == self.config.optimize_max_rounds {
                break false;
            }
            self.store.reseed(self.seeds.next_seed());
            rounds += 1;
        };
        debug!(
            "optimize: {} rounds, converged = {}, seed {:#x}",
            rounds, converged, self.store.seed
        );
        OptimizeOutcome { rounds, converged }
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(&self.store)
    }

    /// Printable bucket-by-bucket view of the table.
    pub fn layout(&self) -> Layout<'_, T> {
        Layout { store: &self.store }
    }

    /// Iterate payloads in bucket order, each chain newest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            heads: self.store.heads.iter(),
            nodes: &self.store.nodes,
            cursor: None,
            remaining: self.store.len(),
        }
    }

    fn locate(&self, key: &T) -> Option<Found> {
        let digest = self.contract.hash(key);
        self.store.find(digest, |stored| self.contract.equal(stored, key))
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.store.check_invariants();
        assert!(self.store.exponent >= self.config.min_exponent);
        assert!(self.store.len() <= self.store.capacity() * MAX_LOAD_FACTOR);
    }
}

impl<T, C, R> fmt::Debug for ChainedTable<T, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedTable")
            .field("items", &self.store.len())
            .field("buckets", &self.store.capacity())
            .field("seed", &self.store.seed)
            .finish_non_exhaustive()
    }
}

impl<'a, T, C, R> IntoIterator for &'a ChainedTable<T, C, R>
where
    C: PayloadContract<T>,
    R: SeedSource,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the payloads of a `ChainedTable`.
pub struct Iter<'a, T> {
    heads: core::slice::Iter<'a, Option<NodeKey>>,
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    cursor: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cursor {
                let node = &self.nodes[k];
                self.cursor = node.next;
                self.remaining -= 1;
                return Some(&node.payload);
            }
            self.cursor = *self.heads.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
