//! Error types for Sanket

use thiserror::Error;

/// Sanket error type
#[derive(Error, Debug)]
pub enum SanketError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A nearest-waypoint query ran before any path was installed.
    #[error("Waypoint index queried before the path was received")]
    IndexNotBuilt,

    #[error("Non-finite query point ({x}, {y})")]
    NonFiniteQuery { x: f64, y: f64 },

    #[error("Light count mismatch: {lights} lights but {stop_lines} stop lines")]
    LightCountMismatch { lights: usize, stop_lines: usize },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Detector thread has stopped")]
    DetectorStopped,

    #[error("Thread panicked: {0}")]
    ThreadPanicked(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

impl From<serde_yaml::Error> for SanketError {
    fn from(e: serde_yaml::Error) -> Self {
        SanketError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SanketError>;
