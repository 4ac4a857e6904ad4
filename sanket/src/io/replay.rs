//! Scenario replay through the threaded detector.
//!
//! Runs the full runtime (shared state, mailbox, detector thread, channel
//! publisher) in ground-truth mode. Each frame is posted only after the
//! previous frame's output has been received, so replay never drops frames
//! and outputs line up one-to-one with the scenario's frames.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use tracing::{debug, info};

use crate::classifier::{self, GroundTruthClassifier};
use crate::config::SanketConfig;
use crate::error::{Result, SanketError};
use crate::io::scenario::Scenario;
use crate::publisher::ChannelPublisher;
use crate::shared::SharedState;
use crate::threads::{FrameMailbox, spawn_detector};
use crate::types::{CameraFrame, TrafficWaypoint};

/// How long to wait for the detector to publish a frame's output.
const OUTPUT_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a replay run.
#[derive(Clone, Debug)]
pub struct ReplayReport {
    /// Scenario name
    pub scenario: String,
    /// Published value for every frame, in frame order
    pub outputs: Vec<TrafficWaypoint>,
    pub frames_processed: u64,
    pub frames_dropped: u64,
}

impl ReplayReport {
    /// Stop waypoints in the order they were first published, with
    /// consecutive repeats collapsed.
    pub fn stops(&self) -> Vec<usize> {
        let mut stops: Vec<usize> = Vec::new();
        let mut previous = TrafficWaypoint::NONE;
        for &output in &self.outputs {
            if output != previous
                && let Some(index) = output.index()
            {
                stops.push(index);
            }
            previous = output;
        }
        stops
    }

    /// Last published value.
    pub fn final_output(&self) -> Option<TrafficWaypoint> {
        self.outputs.last().copied()
    }
}

/// Replay `scenario` against the detector configured by `config`.
///
/// Light colours come from the scenario, so the classifier is always the
/// ground-truth one. Fails on the first output that differs from a step's
/// `expect` list.
pub fn replay(config: &SanketConfig, scenario: &Scenario) -> Result<ReplayReport> {
    let stop_lines = scenario.stop_lines().unwrap_or_else(|| config.stop_lines());
    let shared = Arc::new(SharedState::new(stop_lines));

    let mut detector_config = config.detector.clone();
    detector_config.use_ground_truth = true;
    let classifier = classifier::from_config::<GroundTruthClassifier>(&detector_config, None)?;

    let (tx, rx) = unbounded();
    let handle = spawn_detector(
        &detector_config,
        Arc::clone(&shared),
        classifier,
        ChannelPublisher::new(tx),
    )?;

    info!(
        "Replaying scenario '{}' ({} steps, {} frames)",
        scenario.name,
        scenario.steps.len(),
        scenario.total_frames()
    );

    let mut outputs = Vec::with_capacity(scenario.total_frames());
    let result = run_steps(scenario, &shared, &handle.mailbox, &rx, &mut outputs);
    let stopped = handle.shutdown();
    result?;
    stopped?;

    Ok(ReplayReport {
        scenario: scenario.name.clone(),
        outputs,
        frames_processed: shared.frames_processed(),
        frames_dropped: shared.frames_dropped(),
    })
}

fn run_steps(
    scenario: &Scenario,
    shared: &SharedState,
    mailbox: &FrameMailbox,
    rx: &Receiver<TrafficWaypoint>,
    outputs: &mut Vec<TrafficWaypoint>,
) -> Result<()> {
    if !scenario.lights.is_empty() {
        shared.set_lights(scenario.lights.clone())?;
    }

    let path = scenario.waypoints();
    let mut seq = 0u64;

    for (i, step) in scenario.steps.iter().enumerate() {
        if i == scenario.path_from_step {
            shared.set_path(&path)?;
        }
        if let Some(pose) = step.pose {
            shared.set_pose(pose);
        }
        if let Some(colors) = &step.lights {
            shared.set_lights(scenario.lights_with(colors))?;
        }

        for frame in 0..step.frames {
            mailbox.post(CameraFrame::empty(seq))?;
            let output = rx.recv_timeout(OUTPUT_TIMEOUT).map_err(|e| {
                SanketError::Scenario(format!("no output for frame {}: {}", seq, e))
            })?;
            debug!("Step {} frame {}: published {}", i, frame, output);
            outputs.push(output);
            seq += 1;

            if let Some(expected) = step.expect.as_ref().map(|e| e[frame])
                && expected != output.as_i32()
            {
                return Err(SanketError::Scenario(format!(
                    "step {} frame {}: expected {}, published {}",
                    i, frame, expected, output
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_stops_collapse_repeats() {
        let report = ReplayReport {
            scenario: "t".to_string(),
            outputs: vec![
                TrafficWaypoint::NONE,
                TrafficWaypoint::stop_at(7),
                TrafficWaypoint::stop_at(7),
                TrafficWaypoint::NONE,
                TrafficWaypoint::stop_at(7),
                TrafficWaypoint::stop_at(9),
            ],
            frames_processed: 6,
            frames_dropped: 0,
        };
        assert_eq!(report.stops(), vec![7, 7, 9]);
        assert_eq!(report.final_output(), Some(TrafficWaypoint::stop_at(9)));
    }

    #[test]
    fn test_replay_red_light_scenario() {
        let yaml = r#"
name: red then green
path:
  type: straight
  count: 300
stop_line_positions: [[150.0, 0.0]]
lights:
  - {x: 155.0, y: 3.0, z: 5.0}
steps:
  - pose: {x: 100.0, y: 0.0}
    lights: [red]
    frames: 3
    expect: [-1, -1, 150]
  - lights: [green]
    frames: 3
    expect: [150, 150, -1]
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let report = replay(&SanketConfig::default(), &scenario).unwrap();

        assert_eq!(report.outputs.len(), 6);
        assert_eq!(report.stops(), vec![150]);
        assert_eq!(report.frames_processed, 6);
        assert_eq!(report.frames_dropped, 0);
    }

    #[test]
    fn test_replay_reports_mismatch() {
        let yaml = r#"
name: wrong expectation
path:
  type: straight
  count: 300
stop_line_positions: [[150.0, 0.0]]
lights:
  - {x: 155.0, y: 3.0}
steps:
  - pose: {x: 100.0, y: 0.0}
    lights: [red]
    frames: 1
    expect: [150]
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(matches!(
            replay(&SanketConfig::default(), &scenario),
            Err(SanketError::Scenario(_))
        ));
    }
}
