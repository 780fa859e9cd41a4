//! Activity tracking engine: turns a live stream of position fixes and clock
//! ticks into a continuously updated fitness record under a strict
//! idle -> running <-> paused -> completed lifecycle.

pub mod acquisition;
pub mod clock;
pub mod engine;
pub mod machine;
pub mod metrics;
pub mod models;
pub mod source;
pub mod utils;
pub mod waypoints;

pub use acquisition::AcquisitionPolicy;
pub use clock::{Clock, MonotonicClock};
pub use engine::{EngineSnapshot, TrackingEngine};
pub use machine::SessionMachine;
pub use metrics::{FixOutcome, MetricsAccumulator};
pub use models::{
    ActivityKind, ActivitySession, ActivityState, Coordinate, FitnessStats, PositionFix,
    Waypoint, WaypointKind,
};
pub use source::{ChannelSource, FixStream, PositionSource};
