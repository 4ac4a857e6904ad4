//! Scenario files and replay.
//!
//! - **Scenario parsing**: YAML drive recordings (path, lights, steps)
//! - **Replay**: runs a scenario through the threaded detector and checks
//!   the published values
//!
//! ```rust,ignore
//! use sanket::io::{Scenario, replay};
//! use std::path::Path;
//!
//! let scenario = Scenario::load(Path::new("scenarios/red_light.yaml"))?;
//! let report = replay(&config, &scenario)?;
//! println!("Committed stops: {:?}", report.stops());
//! ```

pub mod replay;
pub mod scenario;

pub use replay::{ReplayReport, replay};
pub use scenario::{PathSpec, Scenario, Step};
