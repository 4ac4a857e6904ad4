//! Light colour classification seam.
//!
//! The image classifier itself lives outside this crate; the detector only
//! needs something that maps a frame (and the light it is looking at) to a
//! colour synchronously. Two implementations are provided:
//!
//! - [`GroundTruthClassifier`]: reads the colour carried by the light feed
//!   (simulator / mock mode).
//! - [`TimeoutClassifier`]: wraps a slower classifier, runs it on a worker
//!   thread and gives up after a fixed timeout.
//!
//! Any failure is reported as a [`ClassifierError`]; the detector degrades it
//! to [`LightColor::Unknown`].

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded};
use thiserror::Error;

use crate::config::DetectorConfig;
use crate::error::{Result, SanketError};
use crate::types::{CameraFrame, LightColor, TrafficLight};

/// Classification failure. Never propagated past the frame boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("previous classification still running")]
    Busy,

    #[error("classifier worker is gone")]
    WorkerGone,

    #[error("classification failed: {0}")]
    Failed(String),
}

/// Maps a camera frame to the colour of the light it shows.
pub trait LightClassifier: Send {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "classifier"
    }

    /// Classify `light` in `frame`.
    fn classify(
        &mut self,
        frame: &CameraFrame,
        light: &TrafficLight,
    ) -> std::result::Result<LightColor, ClassifierError>;
}

impl<C: LightClassifier + ?Sized> LightClassifier for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(
        &mut self,
        frame: &CameraFrame,
        light: &TrafficLight,
    ) -> std::result::Result<LightColor, ClassifierError> {
        (**self).classify(frame, light)
    }
}

/// Uses the colour reported by the light feed; `Unknown` when absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroundTruthClassifier;

impl LightClassifier for GroundTruthClassifier {
    fn name(&self) -> &str {
        "ground-truth"
    }

    fn classify(
        &mut self,
        _frame: &CameraFrame,
        light: &TrafficLight,
    ) -> std::result::Result<LightColor, ClassifierError> {
        Ok(light.state.unwrap_or(LightColor::Unknown))
    }
}

type Request = (CameraFrame, TrafficLight);
type Response = std::result::Result<LightColor, ClassifierError>;

/// Bounds an inner classifier with a per-call timeout.
///
/// The inner classifier runs on its own thread. If a call times out, its
/// late reply is discarded, and calls made while it is still running fail
/// with [`ClassifierError::Busy`] instead of queueing behind it.
pub struct TimeoutClassifier {
    name: String,
    timeout: Duration,
    request_tx: Sender<Request>,
    response_rx: Receiver<Response>,
    in_flight: bool,
    _worker: JoinHandle<()>,
}

impl TimeoutClassifier {
    /// Spawn the worker thread for `inner`.
    pub fn spawn<C>(mut inner: C, timeout: Duration) -> Result<Self>
    where
        C: LightClassifier + 'static,
    {
        let name = format!("{} (timeout {:?})", inner.name(), timeout);
        let (request_tx, request_rx) = bounded::<Request>(1);
        let (response_tx, response_rx) = bounded::<Response>(1);

        let worker = thread::Builder::new()
            .name("classifier".into())
            .spawn(move || {
                // Ends when the wrapper (and its request sender) is dropped.
                while let Ok((frame, light)) = request_rx.recv() {
                    let result = inner.classify(&frame, &light);
                    if response_tx.send(result).is_err() {
                        break;
                    }
                }
                tracing::debug!("Classifier worker exiting");
            })?;

        Ok(Self {
            name,
            timeout,
            request_tx,
            response_rx,
            in_flight: false,
            _worker: worker,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drop a late reply from a timed-out call, if it has arrived.
    fn reclaim(&mut self) -> std::result::Result<(), ClassifierError> {
        if !self.in_flight {
            return Ok(());
        }
        match self.response_rx.try_recv() {
            Ok(_) => {
                self.in_flight = false;
                Ok(())
            }
            Err(TryRecvError::Empty) => Err(ClassifierError::Busy),
            Err(TryRecvError::Disconnected) => Err(ClassifierError::WorkerGone),
        }
    }
}

impl LightClassifier for TimeoutClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(
        &mut self,
        frame: &CameraFrame,
        light: &TrafficLight,
    ) -> std::result::Result<LightColor, ClassifierError> {
        self.reclaim()?;

        match self.request_tx.try_send((frame.clone(), *light)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(ClassifierError::Busy),
            Err(TrySendError::Disconnected(_)) => return Err(ClassifierError::WorkerGone),
        }

        match self.response_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.in_flight = true;
                Err(ClassifierError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ClassifierError::WorkerGone),
        }
    }
}

/// Pick the classifier the detector should use.
///
/// Ground-truth mode ignores `camera`. Otherwise the camera classifier is
/// wrapped in a [`TimeoutClassifier`] using `classifier_timeout_ms`.
pub fn from_config<C>(config: &DetectorConfig, camera: Option<C>) -> Result<Box<dyn LightClassifier>>
where
    C: LightClassifier + 'static,
{
    if config.use_ground_truth {
        tracing::info!("Using ground-truth light colours");
        return Ok(Box::new(GroundTruthClassifier));
    }

    let camera = camera.ok_or_else(|| {
        SanketError::Config(
            "use_ground_truth is false but no camera classifier was provided".to_string(),
        )
    })?;
    let timeout = Duration::from_millis(config.classifier_timeout_ms);
    let classifier = TimeoutClassifier::spawn(camera, timeout)?;
    tracing::info!("Using classifier {}", classifier.name());
    Ok(Box::new(classifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sleeps for a configurable time, then answers a fixed colour.
    struct SlowClassifier {
        delay: Duration,
        color: LightColor,
    }

    impl LightClassifier for SlowClassifier {
        fn name(&self) -> &str {
            "slow"
        }

        fn classify(
            &mut self,
            _frame: &CameraFrame,
            _light: &TrafficLight,
        ) -> std::result::Result<LightColor, ClassifierError> {
            thread::sleep(self.delay);
            Ok(self.color)
        }
    }

    struct FailingClassifier;

    impl LightClassifier for FailingClassifier {
        fn classify(
            &mut self,
            _frame: &CameraFrame,
            _light: &TrafficLight,
        ) -> std::result::Result<LightColor, ClassifierError> {
            Err(ClassifierError::Failed("model not loaded".to_string()))
        }
    }

    fn light() -> TrafficLight {
        TrafficLight::new(1.0, 2.0, 3.0)
    }

    #[test]
    fn test_ground_truth() {
        let mut classifier = GroundTruthClassifier;
        let frame = CameraFrame::empty(0);

        let red = light().with_state(LightColor::Red);
        assert_eq!(classifier.classify(&frame, &red), Ok(LightColor::Red));
        assert_eq!(
            classifier.classify(&frame, &light()),
            Ok(LightColor::Unknown)
        );
    }

    #[test]
    fn test_timeout_classifier_passes_result() {
        let inner = SlowClassifier {
            delay: Duration::ZERO,
            color: LightColor::Green,
        };
        let mut classifier = TimeoutClassifier::spawn(inner, Duration::from_secs(2)).unwrap();
        let frame = CameraFrame::empty(1);

        assert_eq!(classifier.classify(&frame, &light()), Ok(LightColor::Green));
        assert_eq!(classifier.classify(&frame, &light()), Ok(LightColor::Green));
    }

    #[test]
    fn test_timeout_classifier_times_out_then_recovers() {
        let inner = SlowClassifier {
            delay: Duration::from_millis(300),
            color: LightColor::Red,
        };
        let mut classifier = TimeoutClassifier::spawn(inner, Duration::from_millis(20)).unwrap();
        let frame = CameraFrame::empty(1);

        assert_eq!(
            classifier.classify(&frame, &light()),
            Err(ClassifierError::Timeout(Duration::from_millis(20)))
        );
        // The slow call is still running.
        assert_eq!(
            classifier.classify(&frame, &light()),
            Err(ClassifierError::Busy)
        );

        // Once the late reply lands it is discarded and the next call runs.
        thread::sleep(Duration::from_millis(500));
        assert_eq!(
            classifier.classify(&frame, &light()),
            Err(ClassifierError::Timeout(Duration::from_millis(20)))
        );
    }

    #[test]
    fn test_timeout_classifier_forwards_failure() {
        let mut classifier =
            TimeoutClassifier::spawn(FailingClassifier, Duration::from_secs(1)).unwrap();
        let result = classifier.classify(&CameraFrame::empty(0), &light());
        assert!(matches!(result, Err(ClassifierError::Failed(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = DetectorConfig::default();

        config.use_ground_truth = true;
        let mut classifier = from_config::<FailingClassifier>(&config, None).unwrap();
        assert_eq!(classifier.name(), "ground-truth");
        let red = light().with_state(LightColor::Red);
        assert_eq!(
            classifier.classify(&CameraFrame::empty(0), &red),
            Ok(LightColor::Red)
        );

        config.use_ground_truth = false;
        assert!(from_config::<FailingClassifier>(&config, None).is_err());

        let classifier = from_config(&config, Some(FailingClassifier)).unwrap();
        assert!(classifier.name().starts_with("classifier"));
    }
}
