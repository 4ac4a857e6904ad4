//! Projection of traffic lights onto the vehicle's path.
//!
//! Each light's stop line is snapped to its nearest waypoint, and the light
//! whose stop waypoint is the smallest non-negative number of path indices
//! ahead of the vehicle's own nearest waypoint is selected.
//!
//! Forward distance is the waypoint index difference, not arc length. The
//! path is densely and roughly uniformly sampled, and the lookahead window is
//! expressed in the same index units.

use tracing::{debug, trace};

use crate::error::{Result, SanketError};
use crate::index::WaypointIndex;
use crate::types::{LightColor, Point2D, TrafficLight, VehiclePose};

/// Result of [`LightProjector::select`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightSelection {
    /// Position of the selected light in the light feed, if any.
    pub light: Option<usize>,
    /// Waypoint nearest to the selected light's stop line.
    pub stop_waypoint: Option<usize>,
    /// Forward distance in waypoint indices. Equals the path length when no
    /// light was selected.
    pub distance: usize,
}

impl LightSelection {
    fn none(path_len: usize) -> Self {
        Self {
            light: None,
            stop_waypoint: None,
            distance: path_len,
        }
    }
}

/// Per-frame observation handed to the debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Stop waypoint of the relevant light, `None` if no light is relevant.
    pub waypoint: Option<usize>,
    pub color: LightColor,
}

impl Observation {
    /// No relevant light: no stop, colour unknown.
    pub const NONE: Observation = Observation {
        waypoint: None,
        color: LightColor::Unknown,
    };
}

/// Selects the nearest traffic light ahead of the vehicle.
#[derive(Clone, Debug)]
pub struct LightProjector {
    lookahead: usize,
}

impl LightProjector {
    /// Create a projector with the given lookahead window (waypoint indices).
    pub fn new(lookahead: usize) -> Self {
        Self { lookahead }
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Find the closest light whose stop line is at or ahead of `car`.
    ///
    /// Lights pair with `stop_lines` by position. An empty light list or an
    /// empty stop line list selects nothing; any other length mismatch is a
    /// [`SanketError::LightCountMismatch`]. Ties on distance go to the light
    /// listed first.
    pub fn select(
        &self,
        car: &Point2D,
        lights: &[TrafficLight],
        stop_lines: &[Point2D],
        index: &WaypointIndex,
    ) -> Result<LightSelection> {
        let path_len = index.len();

        if lights.is_empty() || stop_lines.is_empty() {
            return Ok(LightSelection::none(path_len));
        }
        if lights.len() != stop_lines.len() {
            return Err(SanketError::LightCountMismatch {
                lights: lights.len(),
                stop_lines: stop_lines.len(),
            });
        }

        let car_idx = index.nearest(car)?;
        let mut selection = LightSelection::none(path_len);

        for (i, line) in stop_lines.iter().enumerate() {
            let line_idx = index.nearest(line)?;
            let distance = line_idx as i64 - car_idx as i64;

            if distance >= 0 && (distance as usize) < selection.distance {
                selection = LightSelection {
                    light: Some(i),
                    stop_waypoint: Some(line_idx),
                    distance: distance as usize,
                };
            }
        }

        trace!(
            "Car at waypoint {}, selection {:?} of {} lights",
            car_idx,
            selection,
            lights.len()
        );
        Ok(selection)
    }

    /// Determine the stop waypoint and colour of the relevant light.
    ///
    /// Returns [`Observation::NONE`] when the pose or the path is not known
    /// yet, or when no light lies ahead within the lookahead window. The
    /// `classify` callback is only invoked for a light inside the window.
    pub fn process<F>(
        &self,
        pose: Option<&VehiclePose>,
        lights: &[TrafficLight],
        stop_lines: &[Point2D],
        index: &WaypointIndex,
        classify: F,
    ) -> Result<Observation>
    where
        F: FnOnce(usize, &TrafficLight) -> LightColor,
    {
        let Some(pose) = pose else {
            trace!("No pose yet");
            return Ok(Observation::NONE);
        };
        if !index.is_ready() {
            trace!("No path yet");
            return Ok(Observation::NONE);
        }

        let selection = self.select(&pose.position(), lights, stop_lines, index)?;

        match (selection.light, selection.stop_waypoint) {
            (Some(light_idx), Some(stop_waypoint)) if selection.distance < self.lookahead => {
                let color = classify(light_idx, &lights[light_idx]);
                debug!(
                    "Light {} at {} waypoints ahead (stop at {}): {}",
                    light_idx, selection.distance, stop_waypoint, color
                );
                Ok(Observation {
                    waypoint: Some(stop_waypoint),
                    color,
                })
            }
            (Some(light_idx), _) => {
                trace!(
                    "Light {} is {} waypoints ahead, outside lookahead {}",
                    light_idx, selection.distance, self.lookahead
                );
                Ok(Observation::NONE)
            }
            _ => Ok(Observation::NONE),
        }
    }
}

impl Default for LightProjector {
    fn default() -> Self {
        Self::new(100)
    }
}
