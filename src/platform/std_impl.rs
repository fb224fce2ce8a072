//! Standard library implementations of platform traits.
//!
//! These implementations are only available when the `std` feature is enabled.

use super::{RandomProvider, TimeProvider};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time provider using std::time.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdTimeProvider;

impl StdTimeProvider {
    /// Create a new StdTimeProvider.
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for StdTimeProvider {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Random provider using a simple xorshift64 PRNG.
///
/// Fast and good enough for tag salting. It's seeded from the current time on
/// creation.
pub struct StdRandomProvider {
    state: u64,
}

impl StdRandomProvider {
    /// Create a new StdRandomProvider with time-based seed.
    pub fn new() -> Self {
        // Seed from current time
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x12345678_9abcdef0);

        Self::with_seed(seed)
    }

    /// Create with a specific seed (for testing).
    pub fn with_seed(seed: u64) -> Self {
        // xorshift never leaves the all-zero state
        let seed = if seed == 0 { 0x12345678_9abcdef0 } else { seed };
        Self { state: seed }
    }
}

impl Default for StdRandomProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomProvider for StdRandomProvider {
    fn random(&mut self) -> f64 {
        // xorshift64 algorithm
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;

        // Convert to f64 in [0, 1)
        // Use the upper 53 bits for better distribution
        let mantissa = x >> 11; // 53 bits
        (mantissa as f64) / ((1u64 << 53) as f64)
    }
}
