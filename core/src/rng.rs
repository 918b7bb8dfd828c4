//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! All randomness flows through a RandomSource handed to the
//! controller, so a run is fully reproducible from its seed and
//! tests can script the exact draws they need.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::VecDeque;

/// The injectable source behind every event draw.
pub trait RandomSource {
    /// Uniform index in [0, n). `n` must be > 0.
    fn next_index(&mut self, n: usize) -> usize;
}

/// Seeded production RNG.
pub struct GameRng {
    inner: Pcg64Mcg,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }
}

impl RandomSource for GameRng {
    fn next_index(&mut self, n: usize) -> usize {
        self.next_u64_below(n as u64) as usize
    }
}

/// Replays a fixed list of indices, then cycles through it again.
/// Used by tests to force specific events.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    script: VecDeque<usize>,
}

impl ScriptedRng {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let script: VecDeque<usize> = indices.into_iter().collect();
        assert!(!script.is_empty(), "script must not be empty");
        Self { script }
    }

    /// Always draw the same index.
    pub fn constant(index: usize) -> Self {
        Self::new([index])
    }
}

impl RandomSource for ScriptedRng {
    fn next_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        let next = self.script.pop_front().unwrap_or(0);
        self.script.push_back(next);
        next % n
    }
}
