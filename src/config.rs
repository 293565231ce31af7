//! Table configuration and its validation errors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest capacity exponent the addressing scheme supports. The bucket index
/// is the top `e` bits of a 64-bit product, and the bucket array has to fit
/// in memory, so one bit is held back from the pointer width.
pub const MAX_EXPONENT: u32 = usize::BITS - 1;

/// Capacity used by `init` and `ChainedTable::new`.
pub const DEFAULT_CAPACITY: usize = 2;

/// Smallest exponent a table may collapse to by default (two buckets).
pub const DEFAULT_MIN_EXPONENT: u32 = 1;

/// Errors raised while validating a [`TableConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("capacity overflow: {requested} buckets exceed 2^{max}", max = MAX_EXPONENT)]
    CapacityOverflow { requested: usize },

    #[error("minimum exponent {min_exponent} outside 1..={max}", max = MAX_EXPONENT)]
    MinExponentOutOfRange { min_exponent: u32 },

    #[error("optimize tolerance must be finite and non-negative, got {tolerance}")]
    InvalidTolerance { tolerance: f64 },
}

/// Construction-time knobs for a `ChainedTable`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableConfig {
    /// Requested starting capacity; rounded up to a power of two, minimum 2.
    pub initial_capacity: usize,
    /// Collapse floor: the table never shrinks below `2^min_exponent` buckets.
    pub min_exponent: u32,
    /// Upper bound on re-seed passes in a single `optimize` call.
    pub optimize_max_rounds: u32,
    /// How far the empty-bucket ratio may exceed its expected value before
    /// `optimize` re-seeds.
    pub optimize_tolerance: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            min_exponent: DEFAULT_MIN_EXPONENT,
            optimize_max_rounds: 64,
            optimize_tolerance: 0.0,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn min_exponent(mut self, min_exponent: u32) -> Self {
        self.min_exponent = min_exponent;
        self
    }

    pub fn optimize_max_rounds(mut self, rounds: u32) -> Self {
        self.optimize_max_rounds = rounds;
        self
    }

    pub fn optimize_tolerance(mut self, tolerance: f64) -> Self {
        self.optimize_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_exponent == 0 || self.min_exponent > MAX_EXPONENT {
            return Err(ConfigError::MinExponentOutOfRange {
                min_exponent: self.min_exponent,
            });
        }
        if !self.optimize_tolerance.is_finite() || self.optimize_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                tolerance: self.optimize_tolerance,
            });
        }
        self.initial_exponent().map(|_| ())
    }

    /// Exponent of the starting bucket array: `ceil(log2(max(capacity, 2)))`,
    /// raised to the floor if needed.
    pub(crate) fn initial_exponent(&self) -> Result<u32, ConfigError> {
        let requested = self.initial_capacity;
        let rounded = requested
            .max(DEFAULT_CAPACITY)
            .checked_next_power_of_two()
            .filter(|c| c.trailing_zeros() <= MAX_EXPONENT)
            .ok_or(ConfigError::CapacityOverflow { requested })?;
        Ok(rounded.trailing_zeros().max(self.min_exponent))
    }
}
