//! The full data snapshot the engine and validator operate over.
//!
//! `DataSet` holds all seven entity collections in memory. Storage backends
//! persist it as a single unit; the engine mutates it only inside a store
//! transaction.

use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All seven entity collections
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub pools: Vec<WorkoutPool>,
    #[serde(default)]
    pub pool_workouts: Vec<PoolWorkout>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub action_completions: Vec<ActionCompletion>,
    #[serde(default)]
    pub workouts_received: Vec<WorkoutReceived>,
}

impl DataSet {
    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
            && self.actions.is_empty()
            && self.pools.is_empty()
            && self.sessions.is_empty()
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn workout_mut(&mut self, id: Uuid) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id == id)
    }

    pub fn action(&self, id: Uuid) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn pool(&self, id: Uuid) -> Option<&WorkoutPool> {
        self.pools.iter().find(|p| p.id == id)
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn session_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// The session currently holding the single Active slot, if any
    pub fn active_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| s.is_active())
    }

    // ------------------------------------------------------------------
    // Pool membership
    // ------------------------------------------------------------------

    pub fn is_pool_member(&self, pool_id: Uuid, workout_id: Uuid) -> bool {
        self.pool_workouts
            .iter()
            .any(|pw| pw.pool_id == pool_id && pw.workout_id == workout_id)
    }

    pub fn pool_workout_ids(&self, pool_id: Uuid) -> Vec<Uuid> {
        self.pool_workouts
            .iter()
            .filter(|pw| pw.pool_id == pool_id)
            .map(|pw| pw.workout_id)
            .collect()
    }

    /// Member workouts of a pool that are eligible for selection
    pub fn visible_workouts_in_pool(&self, pool_id: Uuid) -> Vec<Workout> {
        self.pool_workouts
            .iter()
            .filter(|pw| pw.pool_id == pool_id)
            .filter_map(|pw| self.workout(pw.workout_id))
            .filter(|w| w.is_visible())
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn completions_for(&self, session_id: Uuid) -> Vec<&ActionCompletion> {
        self.action_completions
            .iter()
            .filter(|c| c.session_id == session_id)
            .collect()
    }

    pub fn redemptions_for(&self, session_id: Uuid) -> Vec<&WorkoutReceived> {
        self.workouts_received
            .iter()
            .filter(|r| r.session_id == session_id)
            .collect()
    }

    /// Recompute earned points from the completion history
    pub fn recomputed_points_earned(&self, session_id: Uuid) -> u32 {
        self.action_completions
            .iter()
            .filter(|c| c.session_id == session_id)
            .map(|c| c.points_awarded)
            .sum()
    }

    /// Recompute spent points from the redemption history
    pub fn recomputed_points_spent(&self, session_id: Uuid) -> u32 {
        self.workouts_received
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.points_spent)
            .sum()
    }
}
