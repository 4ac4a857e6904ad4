//! Scenario YAML parsing for replay runs.
//!
//! A scenario defines a recorded drive with:
//! - The base path (explicit points or a straight-line generator)
//! - Light positions, optionally with their own stop lines
//! - A sequence of steps, each setting the pose and light colours and then
//!   feeding a number of camera frames
//!
//! ```yaml
//! name: red light ahead
//! path:
//!   type: straight
//!   start: [0.0, 0.0]
//!   heading: 0.0
//!   spacing: 1.0
//!   count: 300
//! stop_line_positions: [[150.0, 0.0]]
//! lights:
//!   - {x: 155.0, y: 3.0, z: 5.0}
//! steps:
//!   - pose: {x: 100.0, y: 0.0}
//!     lights: [red]
//!     frames: 3
//!     expect: [-1, -1, 150]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SanketError};
use crate::types::{LightColor, Point2D, TrafficLight, VehiclePose};

/// A replay scenario loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    /// Human-readable scenario name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: String,

    /// Base path the car follows
    pub path: PathSpec,

    /// Index of the first step at which the path is available. Steps before
    /// it run without a path (cold start).
    #[serde(default)]
    pub path_from_step: usize,

    /// Stop lines overriding the ones in the detector config
    #[serde(default)]
    pub stop_line_positions: Option<Vec<[f64; 2]>>,

    /// Light positions, paired by array position with the stop lines
    #[serde(default)]
    pub lights: Vec<TrafficLight>,

    /// Sequence of replay steps
    pub steps: Vec<Step>,
}

/// Path specification
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSpec {
    /// Explicit waypoint positions
    Points {
        /// Waypoints in path order
        points: Vec<[f64; 2]>,
    },
    /// Evenly spaced waypoints along a ray
    Straight {
        /// Position of waypoint 0
        #[serde(default)]
        start: [f64; 2],
        /// Direction in radians (CCW positive from +X)
        #[serde(default)]
        heading: f64,
        /// Distance between consecutive waypoints in meters
        #[serde(default = "default_spacing")]
        spacing: f64,
        /// Number of waypoints
        count: usize,
    },
}

fn default_spacing() -> f64 {
    1.0
}

impl PathSpec {
    /// Expand into waypoint positions.
    pub fn waypoints(&self) -> Vec<Point2D> {
        match self {
            PathSpec::Points { points } => points.iter().copied().map(Point2D::from).collect(),
            PathSpec::Straight {
                start,
                heading,
                spacing,
                count,
            } => {
                let (sin, cos) = heading.sin_cos();
                (0..*count)
                    .map(|i| {
                        let d = i as f64 * spacing;
                        Point2D::new(start[0] + d * cos, start[1] + d * sin)
                    })
                    .collect()
            }
        }
    }
}

/// One replay step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    /// Pose to report before this step's frames (None = keep previous)
    #[serde(default)]
    pub pose: Option<VehiclePose>,

    /// Ground-truth colour per light (None = keep previous)
    #[serde(default)]
    pub lights: Option<Vec<LightColor>>,

    /// Number of camera frames fed during this step
    #[serde(default = "default_frames")]
    pub frames: usize,

    /// Expected published value per frame (-1 = no stop)
    #[serde(default)]
    pub expect: Option<Vec<i32>>,
}

fn default_frames() -> usize {
    1
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SanketError::Scenario(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)
            .map_err(|e| SanketError::Scenario(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if let Some(lines) = &self.stop_line_positions
            && let Some(i) = lines
                .iter()
                .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(SanketError::Scenario(format!(
                "stop line {} has a non-finite position",
                i
            )));
        }

        for (i, step) in self.steps.iter().enumerate() {
            if let Some(colors) = &step.lights
                && colors.len() != self.lights.len()
            {
                return Err(SanketError::Scenario(format!(
                    "step {} sets {} light colours but the scenario has {} lights",
                    i,
                    colors.len(),
                    self.lights.len()
                )));
            }
            if let Some(expect) = &step.expect
                && expect.len() != step.frames
            {
                return Err(SanketError::Scenario(format!(
                    "step {} expects {} outputs for {} frames",
                    i,
                    expect.len(),
                    step.frames
                )));
            }
        }
        Ok(())
    }

    /// Waypoints of the scenario path.
    pub fn waypoints(&self) -> Vec<Point2D> {
        self.path.waypoints()
    }

    /// Total number of frames across all steps.
    pub fn total_frames(&self) -> usize {
        self.steps.iter().map(|s| s.frames).sum()
    }

    /// Stop lines from the scenario, if it overrides the config.
    pub fn stop_lines(&self) -> Option<Vec<Point2D>> {
        self.stop_line_positions
            .as_ref()
            .map(|lines| lines.iter().copied().map(Point2D::from).collect())
    }

    /// Lights carrying the given ground-truth colours.
    pub fn lights_with(&self, colors: &[LightColor]) -> Vec<TrafficLight> {
        self.lights
            .iter()
            .zip(colors)
            .map(|(light, &color)| light.with_state(color))
            .collect()
    }
}
