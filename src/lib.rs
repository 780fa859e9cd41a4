pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_utils;
pub mod sessions;
pub mod tracking;

pub use error::{Result, TrackerError};
