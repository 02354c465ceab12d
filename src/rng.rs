//! Every random draw of a run (mine layouts, random probes) goes through
//! [`GameRng`], so a single seed replays the whole run.
//!
//! Backed by `SmallRng` (xoshiro256++); entropy comes from `getrandom`,
//! which also covers the browser under WASM.

use rand::rngs::SmallRng;
use rand::seq::{index, IndexedRandom};
use rand::{Rng, SeedableRng};

pub struct GameRng {
    inner: SmallRng,
}

impl GameRng {
    /// Seeded from OS or browser entropy.
    pub fn new() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
        }
    }

    /// Reproducible stream for `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::new(),
        }
    }

    /// `amount` distinct indices below `length`.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.inner, length, amount).into_vec()
    }

    /// Uniform pick from a slice, `None` when empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Independent generator seeded from this one.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.inner.random::<u64>())
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new()
    }
}
