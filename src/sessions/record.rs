use crate::error::{Result, TrackerError};
use crate::tracking::models::{ActivitySession, ActivityState};
use crate::tracking::waypoints::validate_timeline;

/// Serialize a completed session. Every field survives `import_json` unchanged.
pub fn export_json(session: &ActivitySession) -> Result<String> {
    ensure_completed(session)?;
    Ok(serde_json::to_string_pretty(session)?)
}

/// Parse and structurally check a previously exported session.
pub fn import_json(content: &str) -> Result<ActivitySession> {
    let session: ActivitySession = serde_json::from_str(content)?;
    ensure_completed(&session)?;
    validate_timeline(&session.waypoints).map_err(TrackerError::invalid_record)?;

    if session.stats.end_time.is_none() {
        return Err(TrackerError::invalid_record("completed session has no end time"));
    }

    Ok(session)
}

fn ensure_completed(session: &ActivitySession) -> Result<()> {
    if session.state != ActivityState::Completed {
        return Err(TrackerError::invalid_record(format!(
            "session {} is {}, only completed sessions are exported",
            session.id, session.state
        )));
    }
    Ok(())
}
