//! Configuration loading for Sanket
//!
//! The file format is the traffic light YAML used by the simulator and the
//! vehicle, extended with a `detector` section:
//!
//! ```yaml
//! stop_line_positions:
//!   - [1148.56, 1184.65]
//!   - [1559.2, 1158.43]
//! expected_light_count: 2
//! detector:
//!   state_count_threshold: 3
//!   waypoint_lookahead: 100
//!   use_ground_truth: false
//! ```
//!
//! Unknown keys (e.g. `camera_info`) are ignored so existing light config
//! files load unchanged.

use crate::error::{Result, SanketError};
use crate::types::Point2D;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct SanketConfig {
    /// Stop line per traffic light, paired by array position with the
    /// light feed.
    #[serde(default)]
    pub stop_line_positions: Vec<[f64; 2]>,

    /// Number of lights the light feed is expected to report. When set it
    /// must equal the number of stop lines.
    #[serde(default)]
    pub expected_light_count: Option<usize>,

    #[serde(default)]
    pub detector: DetectorConfig,
}

/// Detector tunables
#[derive(Clone, Debug, Deserialize)]
pub struct DetectorConfig {
    /// Consecutive identical observations required before a colour is
    /// accepted (default: 3)
    #[serde(default = "default_state_count_threshold")]
    pub state_count_threshold: u32,

    /// Maximum forward path-index distance at which a light is relevant
    /// (default: 100)
    #[serde(default = "default_waypoint_lookahead")]
    pub waypoint_lookahead: usize,

    /// Use the light feed's ground-truth colour instead of the classifier
    /// (default: false)
    #[serde(default)]
    pub use_ground_truth: bool,

    /// Upper bound on a single classification call in milliseconds
    /// (default: 200)
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// How long the detector thread waits for a frame before re-checking
    /// for shutdown, in milliseconds (default: 50)
    #[serde(default = "default_mailbox_poll_ms")]
    pub mailbox_poll_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            state_count_threshold: default_state_count_threshold(),
            waypoint_lookahead: default_waypoint_lookahead(),
            use_ground_truth: false,
            classifier_timeout_ms: default_classifier_timeout_ms(),
            mailbox_poll_ms: default_mailbox_poll_ms(),
        }
    }
}

// Default value functions
fn default_state_count_threshold() -> u32 {
    3
}
fn default_waypoint_lookahead() -> usize {
    100
}
fn default_classifier_timeout_ms() -> u64 {
    200
}
fn default_mailbox_poll_ms() -> u64 {
    50
}

impl Default for SanketConfig {
    fn default() -> Self {
        Self {
            stop_line_positions: Vec::new(),
            expected_light_count: None,
            detector: DetectorConfig::default(),
        }
    }
}

impl SanketConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SanketError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SanketConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self
            .stop_line_positions
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(SanketError::Config(format!(
                "stop line {} has a non-finite position",
                i
            )));
        }

        if let Some(expected) = self.expected_light_count
            && expected != self.stop_line_positions.len()
        {
            return Err(SanketError::Config(format!(
                "expected_light_count is {} but {} stop lines are configured",
                expected,
                self.stop_line_positions.len()
            )));
        }

        if self.detector.state_count_threshold == 0 {
            return Err(SanketError::Config(
                "state_count_threshold must be at least 1".to_string(),
            ));
        }

        if self.detector.classifier_timeout_ms == 0 {
            return Err(SanketError::Config(
                "classifier_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Stop line positions as points.
    pub fn stop_lines(&self) -> Vec<Point2D> {
        self.stop_line_positions
            .iter()
            .copied()
            .map(Point2D::from)
            .collect()
    }
}
