//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(stream, iteration)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, independently of thread
//! scheduling order, so simulation results are identical regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
///
/// The stream label keeps different techniques from sharing draws under the
/// same master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Hierarchy seeded from the thread-local OS-backed generator.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for `(stream, iteration)`.
    pub fn sub_seed(&self, stream: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, stream: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, iteration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let h = RngHierarchy::new(42);
        assert_eq!(h.sub_seed("shuffle", 0), h.sub_seed("shuffle", 0));
    }

    #[test]
    fn different_streams_different_seeds() {
        let h = RngHierarchy::new(42);
        assert_ne!(h.sub_seed("shuffle", 0), h.sub_seed("bootstrap", 0));
    }

    #[test]
    fn different_iterations_different_seeds() {
        let h = RngHierarchy::new(42);
        assert_ne!(h.sub_seed("shuffle", 0), h.sub_seed("shuffle", 1));
    }

    #[test]
    fn derivation_order_independent() {
        let h = RngHierarchy::new(7);
        let a_first = h.sub_seed("shuffle", 3);
        let b_second = h.sub_seed("shuffle", 9);
        let b_first = h.sub_seed("shuffle", 9);
        let a_second = h.sub_seed("shuffle", 3);
        assert_eq!(a_first, a_second);
        assert_eq!(b_first, b_second);
    }

    #[test]
    fn different_master_seeds_different_output() {
        assert_ne!(
            RngHierarchy::new(42).sub_seed("shuffle", 0),
            RngHierarchy::new(43).sub_seed("shuffle", 0)
        );
    }

    #[test]
    fn rng_streams_replay() {
        let h = RngHierarchy::new(99);
        let mut a = h.rng_for("s", 1);
        let mut b = h.rng_for("s", 1);
        for _ in 0..5 {
            assert_eq!(a.gen::<u32>(), b.gen::<u32>());
        }
    }
}
