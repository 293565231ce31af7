//! Seed entropy for the table's multiplicative addressing.
//!
//! Each table owns its source; there is no process-wide "already seeded"
//! state. Any `rand` generator works, and the default is a PCG64 stream
//! keyed from OS entropy so two tables never share a seed sequence.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

/// Supplies a fresh 64-bit seed whenever the table (re)seeds.
pub trait SeedSource {
    /// Next seed. Always odd, so `seed * digest` is a bijection on `u64`.
    fn next_seed(&mut self) -> u64;
}

impl<R: RngCore> SeedSource for R {
    #[inline]
    fn next_seed(&mut self) -> u64 {
        self.next_u64() | 1
    }
}

/// Default source for tables that do not inject one.
pub type DefaultSeedSource = Pcg64;

pub(crate) fn entropy_source() -> DefaultSeedSource {
    Pcg64::from_entropy()
}
