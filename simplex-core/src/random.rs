//! Per-engine pseudo-random stream.
//!
//! Perturbations and permutations draw from a stream owned by the
//! engine and seeded from the options, so solves are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded random stream.
#[derive(Debug, Clone)]
pub struct SimplexRandom {
    rng: StdRng,
}

impl SimplexRandom {
    /// Create a stream from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Reseed the stream.
    pub fn initialise(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Uniform fraction in [0, 1).
    #[inline]
    pub fn fraction(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform integer in [0, bound).
    #[inline]
    pub fn integer(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle(&mut self, values: &mut [usize]) {
        for i in (1..values.len()).rev() {
            let j = self.integer(i + 1);
            values.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducible() {
        let mut a = SimplexRandom::new(42);
        let mut b = SimplexRandom::new(42);
        for _ in 0..10 {
            assert_eq!(a.fraction(), b.fraction());
        }
    }

    #[test]
    fn test_fraction_range() {
        let mut random = SimplexRandom::new(7);
        for _ in 0..100 {
            let f = random.fraction();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut random = SimplexRandom::new(3);
        let mut values: Vec<usize> = (0..20).collect();
        random.shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<usize>>());
    }
}
