//! # Sanket
//!
//! Red traffic light stop-waypoint detector.
//!
//! ## Overview
//!
//! For every camera frame Sanket decides whether the car must stop for a red
//! light ahead and, if so, at which waypoint of the base path. The pipeline
//! has three stages:
//!
//! - **Projection** ([`LightProjector`]): find the nearest light whose stop
//!   line lies ahead of the car on the path, using a [`WaypointIndex`]
//! - **Classification** ([`classifier`]): colour of that light, from ground
//!   truth or a camera classifier
//! - **Debouncing** ([`StateDebouncer`]): only commit a colour after it has
//!   been seen on several consecutive frames
//!
//! The published value is the stop waypoint index, or `-1` when there is
//! nothing to stop for.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sanket::{GroundTruthClassifier, SanketConfig, SharedState, TrafficWaypoint, spawn_detector};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = SanketConfig::load(Path::new("configs/sanket.yaml"))?;
//! let shared = Arc::new(SharedState::new(config.stop_lines()));
//! let handle = spawn_detector(
//!     &config.detector,
//!     Arc::clone(&shared),
//!     Box::new(GroundTruthClassifier),
//!     |wp: TrafficWaypoint| -> sanket::Result<()> {
//!         println!("stop at {}", wp);
//!         Ok(())
//!     },
//! )?;
//!
//! shared.set_path(&waypoints)?;
//! shared.set_pose(pose);
//! handle.mailbox.post(frame)?;
//! ```
//!
//! ## Coordinate System
//!
//! Map frame, meters, `f64`. Path distances are counted in waypoint indices,
//! not meters.

pub mod classifier;
pub mod config;
pub mod debouncer;
pub mod detector;
pub mod error;
pub mod index;
pub mod io;
pub mod projector;
pub mod publisher;
pub mod shared;
pub mod threads;
pub mod types;

pub use classifier::{
    ClassifierError, GroundTruthClassifier, LightClassifier, TimeoutClassifier,
};
pub use config::{DetectorConfig, SanketConfig};
pub use debouncer::StateDebouncer;
pub use detector::TrafficLightDetector;
pub use error::{Result, SanketError};
pub use index::WaypointIndex;
pub use projector::{LightProjector, LightSelection, Observation};
pub use publisher::{ChannelPublisher, WaypointPublisher};
pub use shared::SharedState;
pub use threads::{DetectorHandle, FrameMailbox, spawn_detector};
pub use types::{CameraFrame, LightColor, Point2D, TrafficLight, TrafficWaypoint, VehiclePose};
