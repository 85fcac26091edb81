//! Seedable random source.
//!
//! Every randomized decision in the pipeline (phrase choice, follow-up
//! chaining, suggestion shuffling, coin tosses) goes through one [`Dice`]
//! value, so tests can inject a fixed seed instead of relying on ambient
//! randomness.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

/// A single random source shared by all pipeline stages.
pub struct Dice {
    rng: StdRng,
}

impl Dice {
    /// Create a source seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a deterministic source for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fair coin.
    pub fn coin_toss(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Pick one element at random, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// A uniformly random index below `len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Up to `n` elements sampled without replacement, in shuffled order.
    pub fn pick_many<T: Clone>(&mut self, items: &[T], n: usize) -> Vec<T> {
        let mut copy = items.to_vec();
        copy.shuffle(&mut self.rng);
        copy.truncate(n.min(items.len()));
        copy
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}
