//! Live temperature threshold
//!
//! `ThresholdConfig` is the only shared mutable state on the message path.
//! The value is an `f64` stored as its bit pattern in an `AtomicU64`, so a
//! reader always sees a complete value written by exactly one `set`, reads
//! never block, and racing writers resolve to whichever swap lands last.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

#[derive(Debug)]
pub struct ThresholdConfig {
    bits: AtomicU64,
}

impl ThresholdConfig {
    /// Threshold used until the first desired-properties update arrives.
    pub const DEFAULT: f64 = 25.0;

    pub fn new(threshold: f64) -> Self {
        Self {
            bits: AtomicU64::new(threshold.to_bits()),
        }
    }

    /// Current threshold, as installed by the most recently completed `set`.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Install a new threshold and return the one it replaced.
    ///
    /// Evaluations that already read the old value are not revisited.
    pub fn set(&self, threshold: f64) -> f64 {
        let previous = f64::from_bits(self.bits.swap(threshold.to_bits(), Ordering::AcqRel));
        info!("Temperature threshold changed from {previous} to {threshold}");
        previous
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}
