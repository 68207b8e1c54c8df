//! CSV session report for spreadsheet analysis.

use crate::{DataSet, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    name: String,
    status: String,
    started_at: String,
    ended_at: Option<String>,
    points_earned: u32,
    points_spent: u32,
    balance: u32,
    completions: usize,
    redemptions: usize,
}

/// Write all sessions to a CSV file, newest first
///
/// Replaces any existing file and returns the number of rows written.
pub fn write_session_report(data: &DataSet, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut sessions = data.sessions.clone();
    sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    let mut writer = csv::Writer::from_path(path)?;
    for session in &sessions {
        writer.serialize(CsvRow {
            id: session.id.to_string(),
            name: session.name.clone(),
            status: session.status.to_string(),
            started_at: session.started_at.to_rfc3339(),
            ended_at: session.ended_at.map(|t| t.to_rfc3339()),
            points_earned: session.points_earned,
            points_spent: session.points_spent,
            balance: session.balance(),
            completions: data.completions_for(session.id).len(),
            redemptions: data.redemptions_for(session.id).len(),
        })?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} sessions to {:?}", sessions.len(), path);
    Ok(sessions.len())
}
