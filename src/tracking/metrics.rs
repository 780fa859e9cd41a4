use chrono::{DateTime, Utc};
use tracing::debug;

use super::models::{ActivityKind, Coordinate, FitnessStats, PositionFix};
use super::utils::{haversine_distance, pace_from_speed, span};
use crate::config::TrackingConfig;

/// What the accumulator did with a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// First fix of the session, stored as reference only.
    Anchored,
    /// Closer than the movement threshold to the last accepted fix.
    Jitter { distance: f64 },
    Accepted { distance: f64, route_point: bool },
}

impl FixOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FixOutcome::Jitter { .. })
    }
}

/// Reducer from fixes and clock ticks to `FitnessStats`.
///
/// Holds only derived working state; the stats and route it writes to belong
/// to the session.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    kind: ActivityKind,
    config: TrackingConfig,
    last_fix: Option<PositionFix>,
    last_altitude: Option<f64>,
    /// Clock time of the last fix that moved the session.
    last_moved_at: Option<DateTime<Utc>>,
}

impl MetricsAccumulator {
    pub fn new(kind: ActivityKind, config: &TrackingConfig) -> Self {
        Self {
            kind,
            config: config.clone(),
            last_fix: None,
            last_altitude: None,
            last_moved_at: None,
        }
    }

    /// Forget the reference position so the next fix becomes a new anchor.
    ///
    /// Used on resume: ground covered while paused never reaches the stats.
    pub fn rebase(&mut self, stats: &mut FitnessStats) {
        self.last_fix = None;
        self.last_altitude = None;
        self.last_moved_at = None;
        stats.current_speed = 0.0;
        stats.current_pace = None;
    }

    /// Clock tick: decay the instantaneous speed once no movement has been
    /// accepted for `stale_speed_after`, then refresh.
    pub fn on_tick(&self, stats: &mut FitnessStats, now: DateTime<Utc>) {
        let stale = self
            .last_moved_at
            .map_or(true, |moved| span(moved, now) >= self.config.stale_speed_after);
        if stale {
            stats.current_speed = 0.0;
        }
        self.refresh(stats, now);
    }

    pub fn on_fix(
        &mut self,
        stats: &mut FitnessStats,
        route: &mut Vec<Coordinate>,
        fix: &PositionFix,
        now: DateTime<Utc>,
    ) -> FixOutcome {
        let Some(last) = self.last_fix.as_ref() else {
            self.last_fix = Some(fix.clone());
            self.last_altitude = fix.altitude;
            self.last_moved_at = Some(now);
            self.store_route_point(route, fix);
            self.refresh(stats, now);
            return FixOutcome::Anchored;
        };

        let distance = haversine_distance(last.coordinate(), fix.coordinate());
        if distance < self.config.movement_threshold {
            debug!(distance, "Fix below movement threshold, ignored");
            return FixOutcome::Jitter { distance };
        }

        stats.distance += distance;
        let route_point = self.store_route_point(route, fix);

        stats.current_speed = match fix.speed {
            Some(speed) if speed > 0.0 => speed,
            _ => {
                let secs = span(last.timestamp, fix.timestamp).as_secs_f64();
                if secs > 0.0 {
                    distance / secs
                } else {
                    0.0
                }
            }
        };
        if stats.current_speed > stats.max_speed {
            stats.max_speed = stats.current_speed;
        }

        if let (Some(previous), Some(current)) = (self.last_altitude, fix.altitude) {
            if current > previous {
                stats.elevation_gain += current - previous;
            }
        }

        let step_length = self.kind.step_length();
        if step_length > 0.0 {
            stats.steps += (distance / step_length).round() as u64;
        }

        self.last_fix = Some(fix.clone());
        self.last_moved_at = Some(now);
        if fix.altitude.is_some() {
            self.last_altitude = fix.altitude;
        }

        self.refresh(stats, now);
        FixOutcome::Accepted {
            distance,
            route_point,
        }
    }

    /// Recompute every time-derived field as of `now`.
    pub fn refresh(&self, stats: &mut FitnessStats, now: DateTime<Utc>) {
        let elapsed = span(stats.start_time, now);
        debug_assert!(
            stats.paused <= elapsed,
            "paused duration exceeds elapsed time"
        );

        stats.elapsed = elapsed;
        stats.active = elapsed.saturating_sub(stats.paused);

        let active_secs = stats.active.as_secs_f64();
        stats.average_speed = if active_secs > 0.0 {
            stats.distance / active_secs
        } else {
            0.0
        };
        stats.average_pace = pace_from_speed(stats.average_speed, 0.0);
        stats.current_pace = pace_from_speed(stats.current_speed, self.config.min_pace_speed);

        let active_hours = active_secs / 3600.0;
        stats.calories = if active_secs > 0.0 {
            (self.kind.met() * self.config.body_weight_kg * active_hours).round() as u32
        } else {
            0
        };
    }

    fn store_route_point(&self, route: &mut Vec<Coordinate>, fix: &PositionFix) -> bool {
        if fix.accuracy > self.config.route_max_accuracy {
            return false;
        }

        let point = fix.coordinate();
        let far_enough = route
            .last()
            .map_or(true, |last| {
                haversine_distance(*last, point) >= self.config.route_min_spacing
            });

        if far_enough {
            route.push(point);
        }
        far_enough
    }
}
