//! Threaded runtime for the detector.
//!
//! Feed writers (pose, path, lights) call into [`SharedState`] from whatever
//! thread delivers them. Camera frames go through a depth-one
//! [`FrameMailbox`] to a single detector thread, which runs the pipeline and
//! hands each output to a [`WaypointPublisher`].

mod detector;
mod mailbox;

pub use detector::DetectorThread;
pub use mailbox::FrameMailbox;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::classifier::LightClassifier;
use crate::config::DetectorConfig;
use crate::detector::TrafficLightDetector;
use crate::error::{Result, SanketError};
use crate::publisher::WaypointPublisher;
use crate::shared::SharedState;

/// Handle to a running detector thread.
pub struct DetectorHandle {
    /// Producer side of the frame mailbox
    pub mailbox: FrameMailbox,
    handle: JoinHandle<Result<()>>,
}

impl DetectorHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal shutdown and wait for the detector thread.
    ///
    /// Returns the thread's own result (e.g. a publish failure).
    pub fn shutdown(self) -> Result<()> {
        self.mailbox.shared().signal_shutdown();
        self.join()
    }

    /// Wait for the detector thread to exit on its own.
    pub fn join(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|e| SanketError::ThreadPanicked(format!("detector: {:?}", e)))?
    }
}

/// Spawn the detector thread.
pub fn spawn_detector<P>(
    config: &DetectorConfig,
    shared_state: Arc<SharedState>,
    classifier: Box<dyn LightClassifier>,
    publisher: P,
) -> Result<DetectorHandle>
where
    P: WaypointPublisher + 'static,
{
    let (mailbox, frame_rx) = FrameMailbox::new(Arc::clone(&shared_state));
    let detector = TrafficLightDetector::new(config, shared_state, classifier);
    let poll_interval = Duration::from_millis(config.mailbox_poll_ms.max(1));

    let handle = thread::Builder::new()
        .name("detector".into())
        .spawn(move || {
            let _guard = ShutdownOnExit(Arc::clone(detector.shared()));
            let mut detector_thread =
                DetectorThread::new(detector, frame_rx, publisher, poll_interval);
            let result = detector_thread.run();
            if let Err(e) = &result {
                tracing::error!("Detector thread error: {}", e);
            }
            result
        })?;

    Ok(DetectorHandle { mailbox, handle })
}

/// Signals shutdown when the detector thread exits, including by panic, so
/// the mailbox stops accepting frames.
struct ShutdownOnExit(Arc<SharedState>);

impl Drop for ShutdownOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("Detector thread panicked");
        }
        self.0.signal_shutdown();
    }
}
