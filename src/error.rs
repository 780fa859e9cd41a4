use thiserror::Error;

use crate::tracking::models::ActivityState;

/// Commands a caller can issue against a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// A command was issued in a state that does not permit it. State is unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {command} while {state}")]
pub struct InvalidTransition {
    pub command: Command,
    pub state: ActivityState,
}

impl InvalidTransition {
    pub fn new(command: Command, state: ActivityState) -> Self {
        Self { command, state }
    }
}

/// Failures reported by a positional source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("position source unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("position stream fault: {0}")]
    Stream(String),
}

/// Reasons a session could not be started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartError {
    #[error("no position fix after {attempts} attempts")]
    PositionUnavailable { attempts: u32 },

    #[error("position tracking could not be enabled: {0}")]
    SourceUnstartable(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("tracking engine is no longer running")]
    EngineClosed,
}

/// Main error type for activity_tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Start(#[from] StartError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("tracking engine is no longer running")]
    EngineClosed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid session record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GPX error: {0}")]
    Gpx(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    pub fn gpx(msg: impl Into<String>) -> Self {
        Self::Gpx(msg.into())
    }
}
