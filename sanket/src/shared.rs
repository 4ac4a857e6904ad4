//! Shared state between the input feeds and the detector thread.
//!
//! Feeds write at their own cadence:
//! - Pose feed: latest pose wins, no history
//! - Path feed: first non-empty path builds the waypoint index, later
//!   deliveries are ignored
//! - Light feed: each update replaces the whole light set atomically
//!
//! The detector thread reads one consistent snapshot per frame. Debouncer
//! state is not here; it is owned by the detector thread alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SanketError};
use crate::index::WaypointIndex;
use crate::types::{Point2D, TrafficLight, VehiclePose};

/// Shared state between the feeds and the detector.
#[derive(Debug)]
pub struct SharedState {
    /// Latest vehicle pose (None until the first pose arrives)
    pose: RwLock<Option<VehiclePose>>,

    /// Waypoint index, built once from the first path
    waypoints: WaypointIndex,

    /// Latest light set, replaced wholesale on each update
    lights: RwLock<Arc<[TrafficLight]>>,

    /// Configured stop lines, paired with lights by position
    stop_lines: Arc<[Point2D]>,

    /// Shutdown signal for graceful termination
    shutdown: AtomicBool,

    /// Frames run through the detector
    frames_processed: AtomicU64,

    /// Frames evicted from the mailbox before processing
    frames_dropped: AtomicU64,
}

/// Per-frame view of the inputs.
#[derive(Clone, Debug)]
pub struct InputSnapshot {
    pub pose: Option<VehiclePose>,
    pub lights: Arc<[TrafficLight]>,
}

impl SharedState {
    /// Create shared state for the given stop line configuration.
    pub fn new(stop_lines: Vec<Point2D>) -> Self {
        Self {
            pose: RwLock::new(None),
            waypoints: WaypointIndex::new(),
            lights: RwLock::new(Arc::from(Vec::new())),
            stop_lines: Arc::from(stop_lines),
            shutdown: AtomicBool::new(false),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Update the vehicle pose. Non-finite poses are dropped.
    pub fn set_pose(&self, pose: VehiclePose) {
        if !pose.x.is_finite() || !pose.y.is_finite() {
            warn!("Ignoring non-finite pose ({}, {})", pose.x, pose.y);
            return;
        }
        *self.pose.write() = Some(pose);
    }

    /// Latest pose, if any has arrived.
    pub fn pose(&self) -> Option<VehiclePose> {
        *self.pose.read()
    }

    /// Install the path. Only the first non-empty path is used.
    ///
    /// Returns `Ok(true)` if this call built the waypoint index.
    pub fn set_path(&self, waypoints: &[Point2D]) -> Result<bool> {
        if self.waypoints.is_ready() {
            debug!("Path already installed, ignoring {} waypoints", waypoints.len());
            return Ok(false);
        }

        let built = self.waypoints.build(waypoints)?;
        if built {
            info!("Waypoint index built over {} waypoints", waypoints.len());
        }
        Ok(built)
    }

    /// Waypoint index (may not be built yet).
    pub fn waypoint_index(&self) -> &WaypointIndex {
        &self.waypoints
    }

    /// Replace the light set.
    ///
    /// A non-empty set must have exactly one light per configured stop line;
    /// otherwise it is rejected and the previous set stays in place.
    pub fn set_lights(&self, lights: Vec<TrafficLight>) -> Result<()> {
        if !lights.is_empty() && lights.len() != self.stop_lines.len() {
            return Err(SanketError::LightCountMismatch {
                lights: lights.len(),
                stop_lines: self.stop_lines.len(),
            });
        }
        *self.lights.write() = Arc::from(lights);
        Ok(())
    }

    /// Current light set.
    pub fn lights(&self) -> Arc<[TrafficLight]> {
        self.lights.read().clone()
    }

    /// Configured stop lines.
    pub fn stop_lines(&self) -> &[Point2D] {
        &self.stop_lines
    }

    /// Read pose and lights for one frame.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            pose: self.pose(),
            lights: self.lights(),
        }
    }

    /// Signal shutdown.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn record_processed_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_frame(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}
