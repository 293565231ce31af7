//! chain-table: a single-threaded, separate-chaining hash table over an
//! opaque payload type, with seeded multiplicative addressing and
//! load-driven resizing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a reusable storage primitive with amortized O(1) insert, query
//!   and delete, where the table knows nothing about its payloads beyond an
//!   injected hash/equality contract.
//! - Layers:
//!   - BucketStore<T>: the power-of-two array of chain heads plus a
//!     `SlotMap` arena of nodes. Chains are singly linked, newest first.
//!     Owns addressing (`address`) and the resize engine (expand,
//!     collapse, reseed), all built on one in-place rehash.
//!   - ChainedTable<T, C, R>: public API. Holds the payload contract `C`,
//!     the seed source `R` and the config; enforces the load-factor bounds
//!     around each mutation.
//!   - Stats / Layout: read-only diagnostics over the store.
//!
//! Addressing
//! - `index = (seed * digest) >> (64 - e)` for a table of `2^e` buckets:
//!   the high bits of the product, since the low bits of a multiplicative
//!   hash mix poorly. Seeds are always odd.
//! - Each node keeps the digest it was inserted with. Rehashing only
//!   recomputes `address(seed, digest, e)`; the contract is never called
//!   during a resize.
//!
//! Resize policy
//! - Before an insert, if `items / capacity >= 1`, the table doubles.
//! - After a successful removal, if `items / capacity <= 1/4` and the
//!   exponent is above the configured floor, the table halves.
//! - Every resize draws a fresh seed, so an input crafted against one seed
//!   does not keep colliding after the table grows.
//! - `optimize` re-seeds at the same size until the share of empty
//!   buckets is no worse than uniform hashing predicts, up to a round cap.
//!
//! Payload ownership
//! - Nodes own their payloads. `delete` unlinks the first match and hands
//!   the payload to a destroy hook exactly once; `remove` returns it
//!   instead; `drain` empties the table through a hook. Dropping the table
//!   drops whatever is still stored.
//!
//! Duplicates
//! - Inserts never check for an existing equal payload. Equal payloads
//!   coexist; query and removal act on the first match in chain order,
//!   which is newest first until a rehash splices the chain. Deduplication,
//!   if wanted, is the caller's job (`contains` before `insert`).
//!
//! Reentrancy policy
//! - Single-threaded; no internal synchronization and no interior
//!   mutability. The table is `Send`/`Sync` exactly when `T`, `C` and `R`
//!   are, so a shared table only ever serves reads.
//! - Contract callbacks run while the table is borrowed for a lookup or
//!   mutation; entering the same table from a callback is a contract
//!   violation that safe code cannot express. Destroy hooks run after the
//!   structure is consistent again.

mod bucket_store;
mod chained_table;
#[cfg(test)]
mod chained_table_proptest;
pub mod config;
pub mod contract;
mod resize;
pub mod seed;
mod stats;

// Public surface
pub use chained_table::{ChainedTable, Iter, OptimizeOutcome};
pub use config::{ConfigError, TableConfig};
pub use contract::{FnContract, KeyContract, PayloadContract, StdContract};
pub use seed::{DefaultSeedSource, SeedSource};
pub use stats::{Layout, Stats};
