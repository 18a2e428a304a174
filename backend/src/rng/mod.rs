//! xorshift64* random number generator
//!
//! Deterministic PRNG used exclusively by the randomized fixture
//! generator. The simulation pipeline itself consumes no randomness, so
//! a fixed fixture set always replays to an identical timeline.
//!
//! # Determinism
//!
//! Same seed → same sequence. This is CRITICAL for reproducing a run
//! from its scenario parameters alone.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use trial_supply_simulator_core_rs::SimRng;
///
/// let mut rng = SimRng::new(42);
/// let units = rng.range_u32(80, 200); // [80, 200)
/// assert!((80..200).contains(&units));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimRng {
    /// Internal state (64-bit, never zero)
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift state must be nonzero
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate the next random u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate a random value in `[min, max)`
    ///
    /// # Panics
    /// Panics if `min >= max`
    pub fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        assert!(min < max, "min must be less than max");
        let span = (max - min) as u64;
        min + (self.next_u64() % span) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let mut rng = SimRng::new(0);
        // Must still produce values rather than a stuck all-zero state
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_deterministic_sequence() {
        let mut a = SimRng::new(99999);
        let mut b = SimRng::new(99999);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = SimRng::new(12345);
        rng.range_u32(100, 50);
    }

    #[test]
    fn test_range_within_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.range_u32(80, 200);
            assert!((80..200).contains(&v));
        }
    }
}
