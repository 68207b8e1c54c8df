//! Core domain types for the Sweat session and point economy.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workouts, actions and workout pools (the catalog)
//! - Sessions and their point ledger
//! - Append-only history records (completions and redemptions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Catalog Types
// ============================================================================

/// Workout difficulty rating
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        };
        write!(f, "{}", label)
    }
}

/// Workout lifecycle state
///
/// `Hidden` workouts stay resolvable by id (history still points at them)
/// but are never offered for selection. `Deleted` is a tombstone for
/// non-preloaded workouts that carry redemption history and therefore
/// cannot be removed outright.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutVisibility {
    Visible,
    Hidden,
    Deleted,
}

/// A workout that can be redeemed from a pool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
    /// System-seeded workouts cannot be hard-deleted, only hidden
    pub preloaded: bool,
    pub visibility: WorkoutVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    pub fn is_visible(&self) -> bool {
        self.visibility == WorkoutVisibility::Visible
    }
}

/// A predefined action that earns points when completed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub description: String,
    pub points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named, curated set of workouts eligible for random redemption
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutPool {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pool membership join row, unique per (pool, workout) pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolWorkout {
    pub pool_id: Uuid,
    pub workout_id: Uuid,
}

// ============================================================================
// Session Types
// ============================================================================

/// Session state machine states
///
/// `Completed` and `Cancelled` are terminal; no transition leaves them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

/// A workout session with its embedded point ledger
///
/// `points_earned` and `points_spent` are monotonic non-decreasing; the
/// derived balance never goes negative. Both totals are kept in sync with
/// the session's history records by the engine and re-verified by the
/// integrity validator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Immutable after creation
    pub pool_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub points_earned: u32,
    pub points_spent: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Current redeemable points
    pub fn balance(&self) -> u32 {
        self.points_earned.saturating_sub(self.points_spent)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Record of one completed action, append-only
///
/// `points_awarded` snapshots the action's value at completion time, so
/// later edits to the action never rewrite history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionCompletion {
    pub id: Uuid,
    pub session_id: Uuid,
    pub action_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub points_awarded: u32,
}

/// Record of one workout redemption, append-only
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutReceived {
    pub id: Uuid,
    pub session_id: Uuid,
    pub workout_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub points_spent: u32,
}

/// Result of a successful redemption: the history record plus the workout
/// the selector drew, so callers don't have to re-resolve it.
#[derive(Clone, Debug)]
pub struct Redemption {
    pub record: WorkoutReceived,
    pub workout: Workout,
}
