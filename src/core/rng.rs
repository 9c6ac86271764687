//! Deterministic Random Number Generator
//!
//! Uses Xoroshiro128+ for fast, deterministic randomness in the market
//! simulation. Given the same seed, produces identical price paths, which is
//! what lets tests pin and replay market behaviour.
//!
//! This generator is NOT used for server seeds. Those come from the OS CSPRNG
//! (see [`crate::fairness::seed`]).

use rand::RngCore;
use serde::{Serialize, Deserialize};

/// Deterministic PRNG driving the market simulation.
///
/// # Example
///
/// ```
/// use bitmarket::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an RNG seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(rand::rngs::OsRng.next_u64())
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a float uniformly distributed in `[0, 1)`.
    ///
    /// Uses the top 53 bits so every representable step is equally likely.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 * SCALE
    }

    /// Generate a float uniformly distributed in `[min, max)`.
    #[inline]
    pub fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        min + self.next_f64() * (max - min)
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_int_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        min + self.next_int(max - min + 1)
    }

    /// Return `true` with the given probability (clamped to `[0, 1]`).
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability.clamp(0.0, 1.0)
    }

    /// Return `+1.0` with the given probability, `-1.0` otherwise.
    #[inline]
    pub fn signed(&mut self, probability_positive: f64) -> f64 {
        if self.chance(probability_positive) {
            1.0
        } else {
            -1.0
        }
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_known_values() {
        // Pinned: changing these silently changes every seeded market replay.
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u64(), 16629283624882167704);
        assert_eq!(rng.next_u64(), 1420492921613871959);
        assert_eq!(rng.next_u64(), 9768315062676884790);
    }

    #[test]
    fn test_next_f64_bounds() {
        let mut rng = DeterministicRng::new(9999);

        for _ in 0..10_000 {
            let val = rng.next_f64();
            assert!((0.0..1.0).contains(&val));
        }
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = DeterministicRng::new(31);

        for _ in 0..1000 {
            let val = rng.next_f64_range(0.999, 1.001);
            assert!(val >= 0.999 && val < 1.001);
        }

        assert_eq!(rng.next_f64_range(2.0, 2.0), 2.0);
    }

    #[test]
    fn test_next_int_range_inclusive() {
        let mut rng = DeterministicRng::new(5678);
        let mut seen_min = false;
        let mut seen_max = false;

        for _ in 0..5000 {
            let val = rng.next_int_range(30, 45);
            assert!((30..=45).contains(&val));
            seen_min |= val == 30;
            seen_max |= val == 45;
        }

        assert!(seen_min && seen_max, "both endpoints should be reachable");
        assert_eq!(rng.next_int_range(5, 5), 5);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = DeterministicRng::new(77);

        for _ in 0..1000 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
            assert_eq!(rng.signed(1.0), 1.0);
            assert_eq!(rng.signed(0.0), -1.0);
        }
    }

    #[test]
    fn test_state_checkpoint() {
        let mut rng = DeterministicRng::new(5555);

        for _ in 0..50 {
            rng.next_u64();
        }

        let saved_state = rng.state();
        let next_values: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();

        rng.set_state(saved_state);

        for expected in next_values {
            assert_eq!(rng.next_u64(), expected);
        }
    }
}
