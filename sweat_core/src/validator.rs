//! Integrity validation for full data snapshots.
//!
//! Runs three passes over a snapshot before import (and for out-of-band
//! audits), accumulating fatal errors and non-fatal warnings:
//! 1. structural - required collections present, metadata present
//! 2. referential - every join and history row resolves both ends
//! 3. business - empty pools and ledger drift are surfaced but tolerated
//!
//! The validator never mutates anything; import uses the report to decide
//! whether any mutation may begin.

use crate::snapshot::Snapshot;
use crate::types::SessionStatus;
use std::collections::HashSet;
use uuid::Uuid;

/// Outcome of a validation run
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// Fatal findings; any of these rejects the import
    pub errors: Vec<String>,
    /// Non-fatal findings, surfaced to the operator
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_fatal(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All fatal findings as one message, for error propagation
    pub fn summary(&self) -> String {
        self.errors.join("; ")
    }
}

/// Validate a snapshot without mutating anything
pub fn validate(snapshot: &Snapshot) -> ValidationReport {
    let mut report = ValidationReport::default();

    structural_pass(snapshot, &mut report);
    referential_pass(snapshot, &mut report);
    business_pass(snapshot, &mut report);

    tracing::info!(
        "Validated snapshot: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );
    report
}

fn structural_pass(snapshot: &Snapshot, report: &mut ValidationReport) {
    let collections: [(&str, bool); 7] = [
        ("workouts", snapshot.workouts.is_some()),
        ("actions", snapshot.actions.is_some()),
        ("pools", snapshot.pools.is_some()),
        ("pool_workouts", snapshot.pool_workouts.is_some()),
        ("sessions", snapshot.sessions.is_some()),
        ("action_completions", snapshot.action_completions.is_some()),
        ("workouts_received", snapshot.workouts_received.is_some()),
    ];
    for (name, present) in collections {
        if !present {
            report
                .errors
                .push(format!("snapshot is missing the `{}` collection", name));
        }
    }

    match &snapshot.version {
        Some(v) if !v.trim().is_empty() => {}
        _ => report.warnings.push("snapshot has no version tag".into()),
    }
    if snapshot.exported_at.is_none() {
        report
            .warnings
            .push("snapshot has no export timestamp".into());
    }
}

fn referential_pass(snapshot: &Snapshot, report: &mut ValidationReport) {
    let workout_ids: HashSet<Uuid> = snapshot
        .workouts
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|w| w.id)
        .collect();
    let action_ids: HashSet<Uuid> = snapshot
        .actions
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|a| a.id)
        .collect();
    let pool_ids: HashSet<Uuid> = snapshot
        .pools
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|p| p.id)
        .collect();
    let session_ids: HashSet<Uuid> = snapshot
        .sessions
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|s| s.id)
        .collect();

    for pw in snapshot.pool_workouts.as_deref().unwrap_or(&[]) {
        if !pool_ids.contains(&pw.pool_id) {
            report.errors.push(format!(
                "pool membership for workout {} references missing pool {}",
                pw.workout_id, pw.pool_id
            ));
        }
        if !workout_ids.contains(&pw.workout_id) {
            report.errors.push(format!(
                "pool membership in pool {} references missing workout {}",
                pw.pool_id, pw.workout_id
            ));
        }
    }

    for session in snapshot.sessions.as_deref().unwrap_or(&[]) {
        if !pool_ids.contains(&session.pool_id) {
            report.errors.push(format!(
                "session {} references missing pool {}",
                session.id, session.pool_id
            ));
        }
    }

    for completion in snapshot.action_completions.as_deref().unwrap_or(&[]) {
        if !session_ids.contains(&completion.session_id) {
            report.errors.push(format!(
                "action completion {} references missing session {}",
                completion.id, completion.session_id
            ));
        }
        if !action_ids.contains(&completion.action_id) {
            report.errors.push(format!(
                "action completion {} references missing action {}",
                completion.id, completion.action_id
            ));
        }
    }

    for received in snapshot.workouts_received.as_deref().unwrap_or(&[]) {
        if !session_ids.contains(&received.session_id) {
            report.errors.push(format!(
                "workout received {} references missing session {}",
                received.id, received.session_id
            ));
        }
        if !workout_ids.contains(&received.workout_id) {
            report.errors.push(format!(
                "workout received {} references missing workout {}",
                received.id, received.workout_id
            ));
        }
    }
}

fn business_pass(snapshot: &Snapshot, report: &mut ValidationReport) {
    let memberships = snapshot.pool_workouts.as_deref().unwrap_or(&[]);
    for pool in snapshot.pools.as_deref().unwrap_or(&[]) {
        if !memberships.iter().any(|pw| pw.pool_id == pool.id) {
            report.warnings.push(format!(
                "pool {} ({}) has no associated workouts",
                pool.id, pool.name
            ));
        }
    }

    let completions = snapshot.action_completions.as_deref().unwrap_or(&[]);
    let redemptions = snapshot.workouts_received.as_deref().unwrap_or(&[]);
    for session in snapshot.sessions.as_deref().unwrap_or(&[]) {
        let earned: u32 = completions
            .iter()
            .filter(|c| c.session_id == session.id)
            .map(|c| c.points_awarded)
            .sum();
        let spent: u32 = redemptions
            .iter()
            .filter(|r| r.session_id == session.id)
            .map(|r| r.points_spent)
            .sum();

        // Drift is tolerated (legacy data) but always surfaced
        if session.points_earned != earned {
            report.warnings.push(format!(
                "session {} stores points_earned {} but completions sum to {}",
                session.id, session.points_earned, earned
            ));
        }
        if session.points_spent != spent {
            report.warnings.push(format!(
                "session {} stores points_spent {} but redemptions sum to {}",
                session.id, session.points_spent, spent
            ));
        }
    }

    let active_count = snapshot
        .sessions
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter(|s| s.status == SessionStatus::Active)
        .count();
    if active_count > 1 {
        report.warnings.push(format!(
            "snapshot contains {} active sessions, expected at most one",
            active_count
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::dataset::DataSet;
    use crate::snapshot;
    use crate::types::*;
    use chrono::Utc;

    fn seeded_snapshot() -> Snapshot {
        let mut data = DataSet::default();
        catalog::seed_defaults(&mut data);
        snapshot::export(&data)
    }

    #[test]
    fn test_clean_snapshot_passes() {
        let report = validate(&seeded_snapshot());
        assert!(!report.is_fatal(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn test_missing_collection_is_fatal() {
        let mut snap = seeded_snapshot();
        snap.sessions = None;

        let report = validate(&snap);
        assert!(report.is_fatal());
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("`sessions` collection")));
    }

    #[test]
    fn test_missing_metadata_is_only_a_warning() {
        let mut snap = seeded_snapshot();
        snap.version = None;
        snap.exported_at = None;

        let report = validate(&snap);
        assert!(!report.is_fatal());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_dangling_workout_reference_names_the_id() {
        let mut snap = seeded_snapshot();
        let session_id = Uuid::new_v4();
        snap.sessions.as_mut().unwrap().push(Session {
            id: session_id,
            name: "s".into(),
            description: None,
            pool_id: snap.pools.as_ref().unwrap()[0].id,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            status: SessionStatus::Completed,
            points_earned: 5,
            points_spent: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let missing_workout = Uuid::new_v4();
        snap.workouts_received.as_mut().unwrap().push(WorkoutReceived {
            id: Uuid::new_v4(),
            session_id,
            workout_id: missing_workout,
            received_at: Utc::now(),
            points_spent: 5,
        });
        // Completion keeps the ledger consistent so only the dangling
        // reference is reported
        snap.action_completions.as_mut().unwrap().push(ActionCompletion {
            id: Uuid::new_v4(),
            session_id,
            action_id: snap.actions.as_ref().unwrap()[0].id,
            completed_at: Utc::now(),
            points_awarded: 5,
        });

        let report = validate(&snap);
        assert!(report.is_fatal());
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains(&missing_workout.to_string())));
    }

    #[test]
    fn test_ledger_drift_is_a_warning_not_an_error() {
        let mut snap = seeded_snapshot();
        snap.sessions.as_mut().unwrap().push(Session {
            id: Uuid::new_v4(),
            name: "legacy".into(),
            description: None,
            pool_id: snap.pools.as_ref().unwrap()[0].id,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            status: SessionStatus::Completed,
            points_earned: 40,
            points_spent: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let report = validate(&snap);
        assert!(!report.is_fatal());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("points_earned 40")));
    }

    #[test]
    fn test_empty_pool_is_a_warning() {
        let mut snap = seeded_snapshot();
        snap.pools.as_mut().unwrap().push(WorkoutPool {
            id: Uuid::new_v4(),
            name: "Barren".into(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let report = validate(&snap);
        assert!(!report.is_fatal());
        assert!(report.warnings.iter().any(|w| w.contains("Barren")));
    }

    #[test]
    fn test_multiple_active_sessions_warn() {
        let mut snap = seeded_snapshot();
        let pool_id = snap.pools.as_ref().unwrap()[0].id;
        for name in ["a", "b"] {
            snap.sessions.as_mut().unwrap().push(Session {
                id: Uuid::new_v4(),
                name: name.into(),
                description: None,
                pool_id,
                started_at: Utc::now(),
                ended_at: None,
                status: SessionStatus::Active,
                points_earned: 0,
                points_spent: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }

        let report = validate(&snap);
        assert!(!report.is_fatal());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("2 active sessions")));
    }
}
