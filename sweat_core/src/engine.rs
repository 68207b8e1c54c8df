//! Session engine: state machine, point ledger and redemption orchestration.
//!
//! Every mutating operation runs inside one store transaction, so the
//! check-then-act pairs (single-active-session check, balance check) are
//! serialized against concurrent callers and a failure leaves no partial
//! state behind.

use crate::selector::WorkoutSelector;
use crate::store::Store;
use crate::types::*;
use crate::{Error, Limits, Result};
use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;

/// The session and point economy engine
///
/// Policy bounds and the randomness source are injected at construction;
/// nothing here reaches for global state.
pub struct SessionEngine<S: Store, R: RngCore> {
    store: S,
    limits: Limits,
    selector: WorkoutSelector<R>,
}

impl<S: Store, R: RngCore> SessionEngine<S, R> {
    pub fn new(store: S, limits: Limits, selector: WorkoutSelector<R>) -> Self {
        Self {
            store,
            limits,
            selector,
        }
    }

    /// The underlying store, for out-of-band work (import/export, reports)
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Start a new session against a pool
    ///
    /// Fails if the name is invalid, the pool is missing or has no visible
    /// workouts, or another session is already active. The active-session
    /// check and the insert happen in the same transaction.
    pub fn start_session(
        &self,
        name: &str,
        pool_id: Uuid,
        description: Option<String>,
    ) -> Result<Session> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("session name is empty".into()));
        }
        if name.chars().count() > self.limits.max_session_name_len {
            return Err(Error::InvalidArgument(format!(
                "session name exceeds {} characters",
                self.limits.max_session_name_len
            )));
        }
        let name = name.to_string();

        self.store.transact(|data| {
            if data.pool(pool_id).is_none() {
                return Err(Error::NotFound {
                    entity: "workout pool",
                    id: pool_id,
                });
            }
            if data.visible_workouts_in_pool(pool_id).is_empty() {
                return Err(Error::EmptyPool { id: pool_id });
            }
            if let Some(active) = data.active_session() {
                return Err(Error::ActiveSessionExists { id: active.id });
            }

            let now = Utc::now();
            let session = Session {
                id: Uuid::new_v4(),
                name,
                description,
                pool_id,
                started_at: now,
                ended_at: None,
                status: SessionStatus::Active,
                points_earned: 0,
                points_spent: 0,
                created_at: now,
                updated_at: now,
            };
            data.sessions.push(session.clone());
            tracing::info!("Started session {} on pool {}", session.id, pool_id);
            Ok(session)
        })
    }

    /// End the session normally: Active -> Completed, irreversible
    pub fn end_session(&self, session_id: Uuid) -> Result<Session> {
        self.finish_session(session_id, SessionStatus::Completed)
    }

    /// Abandon the session: Active -> Cancelled, irreversible
    pub fn cancel_session(&self, session_id: Uuid) -> Result<Session> {
        self.finish_session(session_id, SessionStatus::Cancelled)
    }

    fn finish_session(&self, session_id: Uuid, terminal: SessionStatus) -> Result<Session> {
        self.store.transact(|data| {
            let session = data.session_mut(session_id).ok_or(Error::NotFound {
                entity: "session",
                id: session_id,
            })?;
            if !session.is_active() {
                return Err(Error::session_not_active(session_id, session.status));
            }

            let now = Utc::now();
            session.status = terminal;
            session.ended_at = Some(now);
            session.updated_at = now;
            tracing::info!("Session {} is now {}", session_id, terminal);
            Ok(session.clone())
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The currently active session, reflecting the latest committed state
    pub fn active_session(&self) -> Result<Option<Session>> {
        self.store.read(|data| Ok(data.active_session().cloned()))
    }

    pub fn session(&self, session_id: Uuid) -> Result<Session> {
        self.store.read(|data| {
            data.session(session_id).cloned().ok_or(Error::NotFound {
                entity: "session",
                id: session_id,
            })
        })
    }

    /// All sessions, most recently started first
    pub fn sessions(&self) -> Result<Vec<Session>> {
        self.store.read(|data| {
            let mut sessions = data.sessions.clone();
            sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            Ok(sessions)
        })
    }

    // ------------------------------------------------------------------
    // Point economy
    // ------------------------------------------------------------------

    /// Record a completed action and award its points
    ///
    /// The completion snapshots the action's current point value, so later
    /// edits to the action never change history. Record and ledger update
    /// commit together or not at all.
    pub fn complete_action(&self, session_id: Uuid, action_id: Uuid) -> Result<ActionCompletion> {
        self.store.transact(|data| {
            let points = data
                .action(action_id)
                .ok_or(Error::NotFound {
                    entity: "action",
                    id: action_id,
                })?
                .points;

            let session = data.session_mut(session_id).ok_or(Error::NotFound {
                entity: "session",
                id: session_id,
            })?;
            if !session.is_active() {
                return Err(Error::session_not_active(session_id, session.status));
            }

            let now = Utc::now();
            session.points_earned += points;
            session.updated_at = now;
            let balance = session.balance();

            let completion = ActionCompletion {
                id: Uuid::new_v4(),
                session_id,
                action_id,
                completed_at: now,
                points_awarded: points,
            };
            data.action_completions.push(completion.clone());

            tracing::info!(
                "Session {} completed action {} for {} points (balance {})",
                session_id,
                action_id,
                points,
                balance
            );
            Ok(completion)
        })
    }

    /// Spend points to receive one randomly chosen workout from the
    /// session's pool
    pub fn redeem_workout(&self, session_id: Uuid, point_cost: u32) -> Result<Redemption> {
        self.redeem(session_id, point_cost, None)
    }

    /// Like [`redeem_workout`](Self::redeem_workout), restricted to one
    /// difficulty
    pub fn redeem_workout_by_difficulty(
        &self,
        session_id: Uuid,
        point_cost: u32,
        difficulty: Difficulty,
    ) -> Result<Redemption> {
        self.redeem(session_id, point_cost, Some(difficulty))
    }

    fn redeem(
        &self,
        session_id: Uuid,
        point_cost: u32,
        difficulty: Option<Difficulty>,
    ) -> Result<Redemption> {
        if point_cost == 0 {
            return Err(Error::InvalidArgument("point cost must be positive".into()));
        }

        self.store.transact(|data| {
            let (pool_id, status, balance) = {
                let session = data.session(session_id).ok_or(Error::NotFound {
                    entity: "session",
                    id: session_id,
                })?;
                (session.pool_id, session.status, session.balance())
            };
            if status != SessionStatus::Active {
                return Err(Error::session_not_active(session_id, status));
            }
            // Balance is checked against the same snapshot the spend is
            // written to; the transaction serializes concurrent redemptions.
            if balance < point_cost {
                return Err(Error::InsufficientPoints {
                    balance,
                    required: point_cost,
                });
            }

            let candidates = data.visible_workouts_in_pool(pool_id);
            let workout = match difficulty {
                Some(d) => self.selector.pick_by_difficulty(&candidates, d),
                None => self.selector.pick(&candidates),
            }
            .ok_or(Error::EmptyPool { id: pool_id })?;

            let now = Utc::now();
            let session = data.session_mut(session_id).ok_or(Error::NotFound {
                entity: "session",
                id: session_id,
            })?;
            session.points_spent += point_cost;
            session.updated_at = now;

            let record = WorkoutReceived {
                id: Uuid::new_v4(),
                session_id,
                workout_id: workout.id,
                received_at: now,
                points_spent: point_cost,
            };
            data.workouts_received.push(record.clone());

            tracing::info!(
                "Session {} redeemed workout {} for {} points",
                session_id,
                workout.id,
                point_cost
            );
            Ok(Redemption { record, workout })
        })
    }
}
