//! Temporal debouncing of per-frame light colours.
//!
//! A single misclassified frame must not flip the vehicle's behaviour. The
//! published stop waypoint only changes once the same colour has been
//! observed for `threshold` consecutive frames (the current frame included).
//! Until then the last published value is repeated unchanged.
//!
//! ```text
//!            observed != state                     count >= threshold
//!   frame ───────────────────▶ state = observed ──────────────────────▶ commit
//!     │                        count = 0             (Red → waypoint,    │
//!     │                                               else → no stop)    │
//!     └──────────── count += 1 ──── count < threshold ──▶ republish last ◀┘
//! ```
//!
//! The machine starts in `Red` with nothing published (`-1`). It has no
//! terminal state and is never reset. `Unknown` is treated like any other
//! colour, so sustained classification failure eventually commits to
//! "no stop".

use tracing::{debug, trace};

use crate::types::{LightColor, TrafficWaypoint};

/// Debounce state machine over traffic light colours.
#[derive(Clone, Debug)]
pub struct StateDebouncer {
    threshold: u32,
    /// Colour of the current run of identical observations.
    state: LightColor,
    /// Last colour that reached the threshold.
    last_state: LightColor,
    /// Length of the current run, including the latest frame.
    state_count: u32,
    last_published: TrafficWaypoint,
}

impl StateDebouncer {
    /// Create a debouncer requiring `threshold` identical frames to commit.
    ///
    /// A threshold of 0 behaves like 1 (every frame commits).
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            state: LightColor::Red,
            last_state: LightColor::Red,
            state_count: 0,
            last_published: TrafficWaypoint::NONE,
        }
    }

    /// Feed one frame's observation and return the value to publish.
    pub fn update(&mut self, waypoint: Option<usize>, observed: LightColor) -> TrafficWaypoint {
        if observed != self.state {
            trace!(
                "Colour changed {} -> {}, restarting count",
                self.state, observed
            );
            self.state = observed;
            self.state_count = 0;
        }
        self.state_count = self.state_count.saturating_add(1);

        if self.state_count >= self.threshold {
            let output = if self.state == LightColor::Red {
                TrafficWaypoint::from_option(waypoint)
            } else {
                TrafficWaypoint::NONE
            };

            if self.last_state != self.state || self.last_published != output {
                debug!(
                    "Committed {} after {} frames, publishing {}",
                    self.state, self.state_count, output
                );
            }
            self.last_state = self.state;
            self.last_published = output;
        }

        self.last_published
    }

    /// Colour of the current run of observations.
    pub fn state(&self) -> LightColor {
        self.state
    }

    /// Last colour accepted as stable.
    pub fn stable_state(&self) -> LightColor {
        self.last_state
    }

    /// Length of the current run of identical observations.
    pub fn state_count(&self) -> u32 {
        self.state_count
    }

    pub fn last_published(&self) -> TrafficWaypoint {
        self.last_published
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for StateDebouncer {
    fn default() -> Self {
        Self::new(3)
    }
}
