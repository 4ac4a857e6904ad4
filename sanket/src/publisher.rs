//! Output sink for the stop waypoint.
//!
//! The transport is external. A publisher receives one value per processed
//! frame; failures are reported, never retried.

use crossbeam_channel::Sender;

use crate::error::{Result, SanketError};
use crate::types::TrafficWaypoint;

/// Destination of the debounced stop waypoint.
pub trait WaypointPublisher: Send {
    fn publish(&mut self, waypoint: TrafficWaypoint) -> Result<()>;
}

impl<F> WaypointPublisher for F
where
    F: FnMut(TrafficWaypoint) -> Result<()> + Send,
{
    fn publish(&mut self, waypoint: TrafficWaypoint) -> Result<()> {
        self(waypoint)
    }
}

/// Publishes into a crossbeam channel.
#[derive(Clone, Debug)]
pub struct ChannelPublisher {
    tx: Sender<TrafficWaypoint>,
}

impl ChannelPublisher {
    pub fn new(tx: Sender<TrafficWaypoint>) -> Self {
        Self { tx }
    }
}

impl WaypointPublisher for ChannelPublisher {
    fn publish(&mut self, waypoint: TrafficWaypoint) -> Result<()> {
        self.tx
            .send(waypoint)
            .map_err(|_| SanketError::Publish("waypoint receiver disconnected".to_string()))
    }
}
