//! Detector thread: one frame at a time from the mailbox to the publisher.
//!
//! The thread blocks on the mailbox with a short timeout so it notices
//! shutdown promptly. Each received frame is processed to completion and its
//! output published before the next frame is taken.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::detector::TrafficLightDetector;
use crate::error::Result;
use crate::publisher::WaypointPublisher;
use crate::shared::SharedState;
use crate::types::CameraFrame;

/// Detector thread state and logic.
pub struct DetectorThread<P> {
    detector: TrafficLightDetector,
    shared_state: Arc<SharedState>,
    frame_rx: Receiver<CameraFrame>,
    publisher: P,
    poll_interval: Duration,
}

impl<P: WaypointPublisher> DetectorThread<P> {
    pub fn new(
        detector: TrafficLightDetector,
        frame_rx: Receiver<CameraFrame>,
        publisher: P,
        poll_interval: Duration,
    ) -> Self {
        let shared_state = Arc::clone(detector.shared());
        Self {
            detector,
            shared_state,
            frame_rx,
            publisher,
            poll_interval,
        }
    }

    /// Run the detector loop until shutdown, mailbox disconnect, or a
    /// publish failure. Signals shutdown on exit.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Detector thread started");
        let result = self.run_loop();

        self.shared_state.signal_shutdown();
        tracing::info!(
            "Detector thread stopped after {} frames ({} dropped)",
            self.shared_state.frames_processed(),
            self.shared_state.frames_dropped()
        );
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        loop {
            if self.shared_state.should_shutdown() {
                tracing::info!("Detector thread shutting down");
                return Ok(());
            }

            match self.frame_rx.recv_timeout(self.poll_interval) {
                Ok(frame) => {
                    let output = self.detector.process_frame(&frame);
                    // Not retried: the sink's owner decides what a failure means.
                    self.publisher.publish(output)?;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Frame mailbox disconnected, detector thread exiting");
                    return Ok(());
                }
            }
        }
    }
}
