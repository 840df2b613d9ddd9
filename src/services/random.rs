//! Randomness used for reviewer selection.
//!
//! The engine never reaches for a global generator. It asks an injected
//! [`RandomSource`], so production draws fresh entropy on every call while
//! tests can plug in a seeded or scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform random choices.
pub trait RandomSource: Send + Sync {
    /// A uniformly random index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;

    /// `amount` distinct indices drawn uniformly from `0..len`, without
    /// replacement. Returns all of `0..len` (shuffled) when `amount >= len`.
    fn sample(&self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        let mut indices: Vec<usize> = (0..len).collect();
        // Partial Fisher-Yates: fix one position per draw.
        for i in 0..amount {
            let j = i + self.pick(len - i);
            indices.swap(i, j);
        }
        indices.truncate(amount);
        indices
    }
}

/// Draws from the thread-local OS-seeded generator on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn sample(&self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut rand::thread_rng(), len, amount.min(len)).into_vec()
    }
}

/// Reproducible source for tests and simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..len)
    }
}
