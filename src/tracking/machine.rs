use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::metrics::{FixOutcome, MetricsAccumulator};
use super::models::{
    ActivityKind, ActivitySession, ActivityState, Coordinate, FitnessStats, PositionFix,
    WaypointKind,
};
use super::utils::span;
use super::waypoints;
use crate::config::TrackingConfig;
use crate::error::{Command, InvalidTransition};

struct ActiveSession {
    session: ActivitySession,
    accumulator: MetricsAccumulator,
    position: Coordinate,
    paused_at: Option<DateTime<Utc>>,
}

impl ActiveSession {
    fn mark(&mut self, kind: WaypointKind, now: DateTime<Utc>) {
        let snapshot = self.session.stats.clone();
        waypoints::record(
            &mut self.session.waypoints,
            kind,
            self.position,
            now,
            Some(snapshot),
        );
    }
}

/// Session lifecycle: idle -> running <-> paused -> completed -> idle.
///
/// Every method is synchronous and takes the current time explicitly; the
/// caller is responsible for serializing calls. A command whose guard does
/// not hold returns `InvalidTransition` and leaves everything untouched.
pub struct SessionMachine {
    config: TrackingConfig,
    active: Option<ActiveSession>,
    completed: Option<ActivitySession>,
}

impl SessionMachine {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            active: None,
            completed: None,
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn state(&self) -> ActivityState {
        match (&self.active, &self.completed) {
            (Some(active), _) => active.session.state,
            (None, Some(_)) => ActivityState::Completed,
            (None, None) => ActivityState::Idle,
        }
    }

    /// The live session, or the finished record once completed.
    pub fn session(&self) -> Option<&ActivitySession> {
        self.active
            .as_ref()
            .map(|active| &active.session)
            .or(self.completed.as_ref())
    }

    pub fn stats(&self) -> Option<&FitnessStats> {
        self.session().map(|session| &session.stats)
    }

    /// Check whether `command` is allowed in the current state.
    pub fn guard(&self, command: Command) -> Result<(), InvalidTransition> {
        let state = self.state();
        let allowed = match command {
            Command::Start => state == ActivityState::Idle,
            Command::Pause => state == ActivityState::Running,
            Command::Resume => state == ActivityState::Paused,
            Command::Stop => matches!(state, ActivityState::Running | ActivityState::Paused),
            Command::Reset => matches!(state, ActivityState::Idle | ActivityState::Completed),
        };

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition::new(command, state))
        }
    }

    /// Open a session at the acquired fix.
    pub fn begin(
        &mut self,
        kind: ActivityKind,
        fix: &PositionFix,
        now: DateTime<Utc>,
        metadata: BTreeMap<String, String>,
    ) -> Result<&ActivitySession, InvalidTransition> {
        self.guard(Command::Start)?;

        let mut session = ActivitySession::new(kind, now);
        session.metadata = metadata;

        let mut accumulator = MetricsAccumulator::new(kind, &self.config);
        accumulator.on_fix(&mut session.stats, &mut session.route, fix, now);

        let mut active = ActiveSession {
            session,
            accumulator,
            position: fix.coordinate(),
            paused_at: None,
        };
        active.mark(WaypointKind::Start, now);

        info!(session_id = %active.session.id, %kind, "Session started");
        let active = self.active.insert(active);
        Ok(&active.session)
    }

    /// Feed a fix. Only processed while running; otherwise dropped and `None` returned.
    pub fn on_fix(&mut self, fix: &PositionFix, now: DateTime<Utc>) -> Option<FixOutcome> {
        let active = self.active.as_mut()?;
        if active.session.state != ActivityState::Running {
            debug!(state = %active.session.state, "Fix dropped outside running state");
            return None;
        }

        let session = &mut active.session;
        let outcome = active
            .accumulator
            .on_fix(&mut session.stats, &mut session.route, fix, now);
        if outcome.is_accepted() {
            active.position = fix.coordinate();
        }
        Some(outcome)
    }

    /// Periodic refresh. Returns false when no running session was refreshed.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.active.as_mut() {
            Some(active) if active.session.state == ActivityState::Running => {
                active.accumulator.on_tick(&mut active.session.stats, now);
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.guard(Command::Pause)?;
        let Some(active) = self.active.as_mut() else {
            return Err(InvalidTransition::new(Command::Pause, ActivityState::Idle));
        };

        active.accumulator.refresh(&mut active.session.stats, now);
        active.session.state = ActivityState::Paused;
        active.paused_at = Some(now);
        active.mark(WaypointKind::Pause, now);

        info!(session_id = %active.session.id, "Session paused");
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.guard(Command::Resume)?;
        let Some(active) = self.active.as_mut() else {
            return Err(InvalidTransition::new(Command::Resume, ActivityState::Idle));
        };

        if let Some(paused_at) = active.paused_at.take() {
            active.session.stats.paused += span(paused_at, now);
        }
        active.session.state = ActivityState::Running;
        active.accumulator.rebase(&mut active.session.stats);
        active.accumulator.refresh(&mut active.session.stats, now);
        active.mark(WaypointKind::Resume, now);

        info!(
            session_id = %active.session.id,
            paused_secs = active.session.stats.paused.as_secs(),
            "Session resumed"
        );
        Ok(())
    }

    /// Finalize the session as of `now` and return the immutable record.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<ActivitySession, InvalidTransition> {
        self.guard(Command::Stop)?;
        let Some(mut active) = self.active.take() else {
            return Err(InvalidTransition::new(Command::Stop, ActivityState::Idle));
        };

        if let Some(paused_at) = active.paused_at.take() {
            active.session.stats.paused += span(paused_at, now);
        }
        active.accumulator.refresh(&mut active.session.stats, now);
        active.session.stats.end_time = Some(now);
        active.mark(WaypointKind::Finish, now);
        active.session.state = ActivityState::Completed;

        let record = active.session;
        info!(
            session_id = %record.id,
            distance = record.stats.distance,
            active_secs = record.stats.active.as_secs(),
            "Session completed"
        );

        self.completed = Some(record.clone());
        Ok(record)
    }

    /// Discard the completed record (or nothing, when idle) and return to idle.
    pub fn reset(&mut self) -> Result<(), InvalidTransition> {
        self.guard(Command::Reset)?;
        self.active = None;
        if let Some(record) = self.completed.take() {
            info!(session_id = %record.id, "Session discarded");
        }
        Ok(())
    }
}
