//! Catalog management: seeded defaults and lifecycle rules.
//!
//! This module provides the built-in workouts, actions and starter pool,
//! plus the mutation helpers that enforce catalog lifecycle rules:
//! - Preloaded workouts can be hidden but never hard-deleted
//! - Workouts referenced by history are tombstoned, not dropped
//! - Actions with completions tied to an active session cannot be removed
//! - Pool membership is unique per (pool, workout) pair

use crate::types::*;
use crate::{DataSet, Error, Limits, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Cached seed data - built once and cloned into empty stores
static DEFAULT_DATASET: Lazy<DataSet> = Lazy::new(build_default_dataset);

/// Get a reference to the cached default catalog data
pub fn get_default_dataset() -> &'static DataSet {
    &DEFAULT_DATASET
}

/// Populate an empty dataset with the preloaded catalog
///
/// No-op if the dataset already holds any data, so callers can run it
/// unconditionally on startup.
pub fn seed_defaults(data: &mut DataSet) {
    if !data.is_empty() {
        return;
    }
    *data = get_default_dataset().clone();
    tracing::info!(
        "Seeded default catalog: {} workouts, {} actions, {} pools",
        data.workouts.len(),
        data.actions.len(),
        data.pools.len()
    );
}

// Preloaded rows carry fixed ids so they keep their identity across
// installs, which lets snapshot imports replace them instead of
// duplicating them.
const SEED_WORKOUT_BASE: u128 = 0x0001_0000;
const SEED_ACTION_BASE: u128 = 0x0002_0000;
const SEED_POOL_ID: u128 = 0x0003_0001;

/// Builds the preloaded catalog: workouts across all difficulties, a set of
/// point-earning actions, and a starter pool containing every workout.
pub fn build_default_dataset() -> DataSet {
    let now = Utc::now();
    let mut data = DataSet::default();

    let preloaded_workouts = [
        ("20-Min Full Body Circuit", 20, Difficulty::Beginner),
        ("Brisk Walk + Stretch", 30, Difficulty::Beginner),
        ("30-Min Dumbbell Strength", 30, Difficulty::Intermediate),
        ("5K Run", 35, Difficulty::Intermediate),
        ("45-Min HIIT Pyramid", 45, Difficulty::Advanced),
        ("Hill Sprint Intervals", 25, Difficulty::Advanced),
        ("90-Min Endurance Ride", 90, Difficulty::Expert),
    ];

    for (i, (name, minutes, difficulty)) in preloaded_workouts.into_iter().enumerate() {
        data.workouts.push(Workout {
            id: Uuid::from_u128(SEED_WORKOUT_BASE + i as u128 + 1),
            name: name.into(),
            duration_minutes: minutes,
            difficulty,
            preloaded: true,
            visibility: WorkoutVisibility::Visible,
            created_at: now,
            updated_at: now,
        });
    }

    let default_actions = [
        ("Drink 2L of water", 5),
        ("Take 10,000 steps", 10),
        ("Prep a healthy meal", 10),
        ("Sleep 8 hours", 15),
        ("Skip dessert for a day", 20),
    ];

    for (i, (description, points)) in default_actions.into_iter().enumerate() {
        data.actions.push(Action {
            id: Uuid::from_u128(SEED_ACTION_BASE + i as u128 + 1),
            description: description.into(),
            points,
            created_at: now,
            updated_at: now,
        });
    }

    let starter_pool = WorkoutPool {
        id: Uuid::from_u128(SEED_POOL_ID),
        name: "Starter Pool".into(),
        description: Some("Every preloaded workout".into()),
        created_at: now,
        updated_at: now,
    };
    for workout in &data.workouts {
        data.pool_workouts.push(PoolWorkout {
            pool_id: starter_pool.id,
            workout_id: workout.id,
        });
    }
    data.pools.push(starter_pool);

    data
}

// ============================================================================
// Workouts
// ============================================================================

/// Add a workout, validating the duration against configured bounds
pub fn add_workout(
    data: &mut DataSet,
    limits: &Limits,
    name: &str,
    duration_minutes: u32,
    difficulty: Difficulty,
) -> Result<Workout> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument("workout name is empty".into()));
    }
    if duration_minutes < limits.min_workout_minutes
        || duration_minutes > limits.max_workout_minutes
    {
        return Err(Error::InvalidArgument(format!(
            "workout duration {} minutes is outside {}..={}",
            duration_minutes, limits.min_workout_minutes, limits.max_workout_minutes
        )));
    }

    let now = Utc::now();
    let workout = Workout {
        id: Uuid::new_v4(),
        name: name.into(),
        duration_minutes,
        difficulty,
        preloaded: false,
        visibility: WorkoutVisibility::Visible,
        created_at: now,
        updated_at: now,
    };
    data.workouts.push(workout.clone());
    Ok(workout)
}

/// Soft-remove a workout from selection pools
pub fn hide_workout(data: &mut DataSet, id: Uuid) -> Result<()> {
    set_visibility(data, id, WorkoutVisibility::Hidden)
}

/// Return a hidden workout to selection pools
pub fn show_workout(data: &mut DataSet, id: Uuid) -> Result<()> {
    set_visibility(data, id, WorkoutVisibility::Visible)
}

fn set_visibility(data: &mut DataSet, id: Uuid, visibility: WorkoutVisibility) -> Result<()> {
    let workout = data.workout_mut(id).ok_or(Error::NotFound {
        entity: "workout",
        id,
    })?;
    if workout.visibility == WorkoutVisibility::Deleted {
        return Err(Error::InvalidState(format!("workout {} is deleted", id)));
    }
    workout.visibility = visibility;
    workout.updated_at = Utc::now();
    tracing::debug!("Workout {} is now {:?}", id, visibility);
    Ok(())
}

/// Remove a workout from the catalog
///
/// Preloaded workouts are refused outright. Workouts still in a pool are
/// refused so the membership edit stays explicit. Workouts with redemption
/// history are tombstoned so old records keep resolving; only fully
/// unreferenced workouts lose their row.
pub fn remove_workout(data: &mut DataSet, id: Uuid) -> Result<()> {
    let workout = data.workout(id).ok_or(Error::NotFound {
        entity: "workout",
        id,
    })?;
    if workout.preloaded {
        return Err(Error::InvalidState(format!(
            "workout {} is preloaded and cannot be deleted, hide it instead",
            id
        )));
    }
    if data.pool_workouts.iter().any(|pw| pw.workout_id == id) {
        return Err(Error::InvalidState(format!(
            "workout {} is still a member of a pool",
            id
        )));
    }

    let has_history = data.workouts_received.iter().any(|r| r.workout_id == id);
    if has_history {
        let workout = data.workout_mut(id).ok_or(Error::NotFound {
            entity: "workout",
            id,
        })?;
        workout.visibility = WorkoutVisibility::Deleted;
        workout.updated_at = Utc::now();
        tracing::debug!("Workout {} tombstoned (redemption history exists)", id);
    } else {
        data.workouts.retain(|w| w.id != id);
        tracing::debug!("Workout {} removed", id);
    }
    Ok(())
}

// ============================================================================
// Actions
// ============================================================================

/// Add an action, validating the point value against configured bounds
pub fn add_action(
    data: &mut DataSet,
    limits: &Limits,
    description: &str,
    points: u32,
) -> Result<Action> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::InvalidArgument("action description is empty".into()));
    }
    if points < limits.min_action_points || points > limits.max_action_points {
        return Err(Error::InvalidArgument(format!(
            "action point value {} is outside {}..={}",
            points, limits.min_action_points, limits.max_action_points
        )));
    }

    let now = Utc::now();
    let action = Action {
        id: Uuid::new_v4(),
        description: description.into(),
        points,
        created_at: now,
        updated_at: now,
    };
    data.actions.push(action.clone());
    Ok(action)
}

/// Remove an action unless a completion ties it to the active session
pub fn remove_action(data: &mut DataSet, id: Uuid) -> Result<()> {
    if data.action(id).is_none() {
        return Err(Error::NotFound {
            entity: "action",
            id,
        });
    }

    let blocked = data.action_completions.iter().any(|c| {
        c.action_id == id
            && data
                .session(c.session_id)
                .map(|s| s.is_active())
                .unwrap_or(false)
    });
    if blocked {
        return Err(Error::InvalidState(format!(
            "action {} has completions in the active session",
            id
        )));
    }

    data.actions.retain(|a| a.id != id);
    tracing::debug!("Action {} removed", id);
    Ok(())
}

// ============================================================================
// Pools
// ============================================================================

/// Add a workout pool
pub fn add_pool(data: &mut DataSet, name: &str, description: Option<String>) -> Result<WorkoutPool> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument("pool name is empty".into()));
    }

    let now = Utc::now();
    let pool = WorkoutPool {
        id: Uuid::new_v4(),
        name: name.into(),
        description,
        created_at: now,
        updated_at: now,
    };
    data.pools.push(pool.clone());
    Ok(pool)
}

/// Add a workout to a pool; the pair must be new and both ends must exist
pub fn add_pool_workout(data: &mut DataSet, pool_id: Uuid, workout_id: Uuid) -> Result<()> {
    if data.pool(pool_id).is_none() {
        return Err(Error::NotFound {
            entity: "workout pool",
            id: pool_id,
        });
    }
    if data.workout(workout_id).is_none() {
        return Err(Error::NotFound {
            entity: "workout",
            id: workout_id,
        });
    }
    if data.is_pool_member(pool_id, workout_id) {
        return Err(Error::InvalidArgument(format!(
            "workout {} is already a member of pool {}",
            workout_id, pool_id
        )));
    }

    data.pool_workouts.push(PoolWorkout {
        pool_id,
        workout_id,
    });
    Ok(())
}

/// Remove a workout from a pool
pub fn remove_pool_workout(data: &mut DataSet, pool_id: Uuid, workout_id: Uuid) -> Result<()> {
    if !data.is_pool_member(pool_id, workout_id) {
        return Err(Error::NotFound {
            entity: "pool membership",
            id: workout_id,
        });
    }
    data.pool_workouts
        .retain(|pw| !(pw.pool_id == pool_id && pw.workout_id == workout_id));
    Ok(())
}
