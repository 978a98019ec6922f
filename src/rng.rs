// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Deterministic PRNG

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic pseudo-random generator for the simulation engine.
///
/// Wraps a seeded `ChaCha8Rng` so that a given seed reproduces the same
/// event stream on every platform regardless of endianness. Not thread-safe;
/// the engine is single-threaded.
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform real strictly inside (0, 1) — never exactly 0 or 1.
    ///
    /// 53 random bits are mapped to (k + 0.5) / 2^53, so the smallest
    /// possible value is 2^-54 and the largest is 1 - 2^-54.
    pub fn uniform_real(&mut self) -> f64 {
        let bits = self.inner.gen::<u64>() >> 11;
        (bits as f64 + 0.5) * (1.0 / 9_007_199_254_740_992.0)
    }

    /// Uniform integer in [0, n). Requires n >= 1.
    pub fn uniform_int(&mut self, n: usize) -> usize {
        debug_assert!(n >= 1, "uniform_int requires n >= 1");
        self.inner.gen_range(0..n)
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng").finish_non_exhaustive()
    }
}
