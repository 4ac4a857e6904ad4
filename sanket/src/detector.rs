//! Per-frame pipeline: project, classify, debounce.
//!
//! [`TrafficLightDetector`] owns everything that changes per frame (the
//! debouncer and the classifier) and reads the feeds through
//! [`SharedState`]. Processing takes `&mut self`, so frames cannot overlap.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, trace, warn};

use crate::classifier::LightClassifier;
use crate::config::DetectorConfig;
use crate::debouncer::StateDebouncer;
use crate::projector::{LightProjector, Observation};
use crate::shared::SharedState;
use crate::types::{CameraFrame, LightColor, TrafficWaypoint};

/// Red light stop-waypoint detector.
pub struct TrafficLightDetector {
    shared: Arc<SharedState>,
    projector: LightProjector,
    debouncer: StateDebouncer,
    classifier: Box<dyn LightClassifier>,
}

impl TrafficLightDetector {
    pub fn new(
        config: &DetectorConfig,
        shared: Arc<SharedState>,
        classifier: Box<dyn LightClassifier>,
    ) -> Self {
        Self {
            shared,
            projector: LightProjector::new(config.waypoint_lookahead),
            debouncer: StateDebouncer::new(config.state_count_threshold),
            classifier,
        }
    }

    /// Run one frame through the pipeline and return the value to publish.
    ///
    /// Never fails: missing inputs and classification failures degrade to an
    /// `Unknown` observation with no stop waypoint.
    pub fn process_frame(&mut self, frame: &CameraFrame) -> TrafficWaypoint {
        let observation = self.observe(frame);
        let output = self
            .debouncer
            .update(observation.waypoint, observation.color);

        self.shared.record_processed_frame();
        trace!(
            "Frame {}: observed {:?}, publishing {}",
            frame.seq, observation, output
        );
        output
    }

    /// Stop waypoint and colour of the relevant light for this frame.
    fn observe(&mut self, frame: &CameraFrame) -> Observation {
        let snapshot = self.shared.snapshot();
        let classifier = &mut self.classifier;

        let result = self.projector.process(
            snapshot.pose.as_ref(),
            &snapshot.lights,
            self.shared.stop_lines(),
            self.shared.waypoint_index(),
            |light_idx, light| {
                // A panicking classifier costs this frame, not the thread.
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(frame, light)));
                match result {
                    Ok(Ok(color)) => color,
                    Ok(Err(e)) => {
                        warn!(
                            "Frame {}: {} failed on light {}: {}",
                            frame.seq,
                            classifier.name(),
                            light_idx,
                            e
                        );
                        LightColor::Unknown
                    }
                    Err(_) => {
                        error!(
                            "Frame {}: {} panicked on light {}",
                            frame.seq,
                            classifier.name(),
                            light_idx
                        );
                        LightColor::Unknown
                    }
                }
            },
        );

        match result {
            Ok(observation) => observation,
            Err(e) => {
                error!("Frame {}: light projection failed: {}", frame.seq, e);
                Observation::NONE
            }
        }
    }

    /// Debouncer state, for status reporting.
    pub fn debouncer(&self) -> &StateDebouncer {
        &self.debouncer
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, GroundTruthClassifier};
    use crate::types::{Point2D, TrafficLight, VehiclePose};

    struct ErrorClassifier;

    impl LightClassifier for ErrorClassifier {
        fn classify(
            &mut self,
            _frame: &CameraFrame,
            _light: &TrafficLight,
        ) -> std::result::Result<LightColor, ClassifierError> {
            Err(ClassifierError::Failed("no model".to_string()))
        }
    }

    struct PanickingClassifier;

    impl LightClassifier for PanickingClassifier {
        fn classify(
            &mut self,
            _frame: &CameraFrame,
            _light: &TrafficLight,
        ) -> std::result::Result<LightColor, ClassifierError> {
            panic!("model crashed");
        }
    }

    fn shared_on_line(n: usize, stop_x: f64) -> Arc<SharedState> {
        let shared = Arc::new(SharedState::new(vec![Point2D::new(stop_x, 0.0)]));
        let path: Vec<Point2D> = (0..n).map(|i| Point2D::new(i as f64, 0.0)).collect();
        shared.set_path(&path).unwrap();
        shared
    }

    fn frames(detector: &mut TrafficLightDetector, count: u64) -> Vec<i32> {
        (0..count)
            .map(|seq| detector.process_frame(&CameraFrame::empty(seq)).as_i32())
            .collect()
    }

    #[test]
    fn test_cold_start_publishes_no_stop() {
        let shared = Arc::new(SharedState::new(vec![Point2D::new(7.0, 0.0)]));
        let mut detector = TrafficLightDetector::new(
            &DetectorConfig::default(),
            Arc::clone(&shared),
            Box::new(GroundTruthClassifier),
        );

        assert_eq!(frames(&mut detector, 5), vec![-1; 5]);
        assert_eq!(shared.frames_processed(), 5);
    }

    #[test]
    fn test_red_light_commits() {
        let shared = shared_on_line(10, 7.0);
        shared.set_pose(VehiclePose::new(2.0, 0.0, 0.0));
        shared
            .set_lights(vec![TrafficLight::new(7.5, 3.0, 5.0).with_state(LightColor::Red)])
            .unwrap();

        let mut detector = TrafficLightDetector::new(
            &DetectorConfig::default(),
            shared,
            Box::new(GroundTruthClassifier),
        );
        assert_eq!(frames(&mut detector, 4), vec![-1, -1, 7, 7]);
    }

    #[test]
    fn test_classifier_failure_degrades_to_unknown() {
        let shared = shared_on_line(10, 7.0);
        shared.set_pose(VehiclePose::new(2.0, 0.0, 0.0));
        shared
            .set_lights(vec![TrafficLight::new(7.5, 3.0, 5.0).with_state(LightColor::Red)])
            .unwrap();

        let mut detector = TrafficLightDetector::new(
            &DetectorConfig::default(),
            shared,
            Box::new(ErrorClassifier),
        );
        assert_eq!(frames(&mut detector, 4), vec![-1; 4]);
        assert_eq!(detector.debouncer().stable_state(), LightColor::Unknown);
    }

    #[test]
    fn test_classifier_panic_degrades_to_unknown() {
        let shared = shared_on_line(10, 7.0);
        shared.set_pose(VehiclePose::new(2.0, 0.0, 0.0));
        shared
            .set_lights(vec![TrafficLight::new(7.5, 3.0, 5.0).with_state(LightColor::Red)])
            .unwrap();

        let mut detector = TrafficLightDetector::new(
            &DetectorConfig::default(),
            Arc::clone(&shared),
            Box::new(PanickingClassifier),
        );
        assert_eq!(frames(&mut detector, 4), vec![-1; 4]);
        assert_eq!(detector.debouncer().stable_state(), LightColor::Unknown);
        assert_eq!(shared.frames_processed(), 4);
    }
}
