//! Depth-one frame mailbox between the camera feed and the detector.
//!
//! The camera can run ahead of the detector. Instead of queueing, the mailbox
//! holds at most one pending frame: posting while a frame is already waiting
//! evicts the stale one, so the detector always picks up the newest frame and
//! never processes two frames at once.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::debug;

use crate::error::{Result, SanketError};
use crate::shared::SharedState;
use crate::types::CameraFrame;

/// Producer side of the frame mailbox. Cheap to clone.
#[derive(Clone, Debug)]
pub struct FrameMailbox {
    tx: Sender<CameraFrame>,
    /// Used only to evict a stale pending frame.
    evict_rx: Receiver<CameraFrame>,
    shared: Arc<SharedState>,
}

impl FrameMailbox {
    /// Create the mailbox and the receiver the detector thread reads from.
    pub fn new(shared: Arc<SharedState>) -> (Self, Receiver<CameraFrame>) {
        let (tx, rx) = bounded(1);
        let mailbox = Self {
            tx,
            evict_rx: rx.clone(),
            shared,
        };
        (mailbox, rx)
    }

    /// Deliver a frame, replacing any frame still waiting.
    ///
    /// Fails with [`SanketError::DetectorStopped`] once shutdown has been
    /// signalled (the detector thread signals it when it exits, whether it
    /// returns or panics).
    pub fn post(&self, mut frame: CameraFrame) -> Result<()> {
        if self.shared.should_shutdown() {
            return Err(SanketError::DetectorStopped);
        }

        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(returned)) => {
                    if let Ok(stale) = self.evict_rx.try_recv() {
                        self.shared.record_dropped_frame();
                        debug!(
                            "Detector busy, dropping frame {} for frame {}",
                            stale.seq, returned.seq
                        );
                    }
                    frame = returned;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(SanketError::DetectorStopped);
                }
            }
        }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Whether a frame is waiting to be processed.
    pub fn is_pending(&self) -> bool {
        !self.tx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_frame_wins() {
        let shared = Arc::new(SharedState::new(Vec::new()));
        let (mailbox, rx) = FrameMailbox::new(Arc::clone(&shared));

        for seq in 0..5 {
            mailbox.post(CameraFrame::empty(seq)).unwrap();
        }

        assert!(mailbox.is_pending());
        assert_eq!(rx.try_recv().unwrap().seq, 4);
        assert!(rx.try_recv().is_err());
        assert_eq!(shared.frames_dropped(), 4);
    }

    #[test]
    fn test_post_after_shutdown() {
        let shared = Arc::new(SharedState::new(Vec::new()));
        let (mailbox, _rx) = FrameMailbox::new(Arc::clone(&shared));

        mailbox.post(CameraFrame::empty(0)).unwrap();
        shared.signal_shutdown();
        assert!(matches!(
            mailbox.post(CameraFrame::empty(1)),
            Err(SanketError::DetectorStopped)
        ));
    }
}
