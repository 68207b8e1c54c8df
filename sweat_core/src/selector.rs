//! Random workout selection with an injectable randomness source.
//!
//! The selector is the only nondeterminism in the engine, so the generator
//! is passed in at construction: `SmallRng::from_os_rng()` in production,
//! `SmallRng::seed_from_u64(..)` in tests.

use crate::types::{Difficulty, Workout};
use rand::{Rng, RngCore};
use std::sync::Mutex;

/// Draws one workout uniformly at random from a candidate list
///
/// Candidates are expected to be pre-filtered to visible workouts; the
/// selector itself never weights by difficulty or duration.
pub struct WorkoutSelector<R: RngCore> {
    rng: Mutex<R>,
}

impl<R: RngCore> WorkoutSelector<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draw one workout, or `None` if there is nothing to draw from
    pub fn pick(&self, candidates: &[Workout]) -> Option<Workout> {
        if candidates.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().unwrap();
        let index = rng.random_range(0..candidates.len());
        Some(candidates[index].clone())
    }

    /// Draw one workout of the given difficulty, or `None` if the
    /// restricted set is empty
    pub fn pick_by_difficulty(
        &self,
        candidates: &[Workout],
        difficulty: Difficulty,
    ) -> Option<Workout> {
        let restricted: Vec<Workout> = candidates
            .iter()
            .filter(|w| w.difficulty == difficulty)
            .cloned()
            .collect();
        self.pick(&restricted)
    }
}
