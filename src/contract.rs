//! Payload contracts: how the table hashes and compares the payloads it
//! stores.
//!
//! The table never looks inside a payload. Everything it needs comes from a
//! [`PayloadContract`]: a 64-bit digest and an equality predicate that must
//! agree with it (equal payloads hash equally).

use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash and equality behavior injected into a `ChainedTable`.
pub trait PayloadContract<T: ?Sized> {
    /// Digest of `payload`. Must be deterministic for the lifetime of the
    /// table; the table mixes its own seed in afterwards.
    fn hash(&self, payload: &T) -> u64;

    /// Whether `stored` matches `probe`. Must be consistent with `hash`.
    fn equal(&self, stored: &T, probe: &T) -> bool;
}

/// Contract built from a pair of closures.
pub struct FnContract<H, E> {
    hash: H,
    equal: E,
}

impl<H, E> FnContract<H, E> {
    pub fn new(hash: H, equal: E) -> Self {
        Self { hash, equal }
    }
}

impl<H, E> fmt::Debug for FnContract<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnContract")
    }
}

impl<T, H, E> PayloadContract<T> for FnContract<H, E>
where
    T: ?Sized,
    H: Fn(&T) -> u64,
    E: Fn(&T, &T) -> bool,
{
    #[inline]
    fn hash(&self, payload: &T) -> u64 {
        (self.hash)(payload)
    }

    #[inline]
    fn equal(&self, stored: &T, probe: &T) -> bool {
        (self.equal)(stored, probe)
    }
}

/// Contract for `T: Hash + Eq`, hashing through a [`BuildHasher`].
///
/// Defaults to hashbrown's builder, which is randomly keyed per instance.
pub struct StdContract<S = DefaultHashBuilder> {
    hasher: S,
}

impl StdContract {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl Default for StdContract {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StdContract<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }
}

impl<S> fmt::Debug for StdContract<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StdContract")
    }
}

impl<T, S> PayloadContract<T> for StdContract<S>
where
    T: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, payload: &T) -> u64 {
        self.hasher.hash_one(payload)
    }

    #[inline]
    fn equal(&self, stored: &T, probe: &T) -> bool {
        stored == probe
    }
}

/// Contract that compares payloads through a projected key, so a table of
/// records can be probed with a record that only has its key fields set.
pub struct KeyContract<F, K: ?Sized, S = DefaultHashBuilder> {
    key_of: F,
    hasher: S,
    _key: PhantomData<fn(&K)>,
}

impl<F, K: ?Sized> KeyContract<F, K> {
    pub fn new<T: ?Sized>(key_of: F) -> Self
    where
        F: Fn(&T) -> &K,
    {
        Self::with_hasher::<T>(key_of, Default::default())
    }
}

impl<F, K: ?Sized, S> KeyContract<F, K, S> {
    pub fn with_hasher<T: ?Sized>(key_of: F, hasher: S) -> Self
    where
        F: Fn(&T) -> &K,
    {
        Self {
            key_of,
            hasher,
            _key: PhantomData,
        }
    }
}

impl<F, K: ?Sized, S> fmt::Debug for KeyContract<F, K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyContract")
    }
}

impl<T, K, F, S> PayloadContract<T> for KeyContract<F, K, S>
where
    T: ?Sized,
    K: ?Sized + Hash + Eq,
    F: Fn(&T) -> &K,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, payload: &T) -> u64 {
        self.hasher.hash_one((self.key_of)(payload))
    }

    #[inline]
    fn equal(&self, stored: &T, probe: &T) -> bool {
        (self.key_of)(stored) == (self.key_of)(probe)
    }
}
