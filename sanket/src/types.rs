//! Core value types shared by the detector components.
//!
//! All positions are in map coordinates (meters, `f64`), matching the
//! precision of the pose and waypoint feeds.

use serde::{Deserialize, Serialize};

/// A 2D point on the map (waypoint position or stop line).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_sq(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Latest known vehicle pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    pub x: f64,
    pub y: f64,
    /// Heading in radians, CCW positive from +X.
    #[serde(default)]
    pub heading: f64,
}

impl VehiclePose {
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Traffic light colour.
///
/// Discriminants follow the conventional traffic light message codes
/// (`UNKNOWN` is 4, there is no 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red = 0,
    Yellow = 1,
    Green = 2,
    Unknown = 4,
}

impl LightColor {
    /// Wire code of this colour.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire code. Unrecognised codes map to `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LightColor::Red,
            1 => LightColor::Yellow,
            2 => LightColor::Green,
            _ => LightColor::Unknown,
        }
    }
}

impl std::fmt::Display for LightColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LightColor::Red => "RED",
            LightColor::Yellow => "YELLOW",
            LightColor::Green => "GREEN",
            LightColor::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// One real-world traffic light as reported by the light feed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficLight {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Authoritative colour, only present when the feed carries ground truth.
    #[serde(default)]
    pub state: Option<LightColor>,
}

impl TrafficLight {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            state: None,
        }
    }

    pub fn with_state(mut self, state: LightColor) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Raw camera frame. The payload is opaque to the detector and only
/// handed through to the classifier.
#[derive(Clone, Debug, Default)]
pub struct CameraFrame {
    /// Monotonic sequence number assigned by the producer.
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    /// Pixel encoding label, e.g. `"bgr8"`.
    pub encoding: String,
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// Frame with no pixel payload. Used by replay and ground-truth runs.
    pub fn empty(seq: u64) -> Self {
        Self {
            seq,
            ..Default::default()
        }
    }
}

/// The published stop signal: waypoint index to stop at, or none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TrafficWaypoint(Option<usize>);

impl TrafficWaypoint {
    /// No stop required.
    pub const NONE: TrafficWaypoint = TrafficWaypoint(None);

    pub const fn stop_at(index: usize) -> Self {
        Self(Some(index))
    }

    pub const fn from_option(index: Option<usize>) -> Self {
        Self(index)
    }

    pub fn index(&self) -> Option<usize> {
        self.0
    }

    pub fn is_stop(&self) -> bool {
        self.0.is_some()
    }

    /// Wire form: the waypoint index, or `-1` when no stop is required.
    pub fn as_i32(&self) -> i32 {
        match self.0 {
            Some(idx) => i32::try_from(idx).unwrap_or(i32::MAX),
            None => -1,
        }
    }
}

impl std::fmt::Display for TrafficWaypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}
