//! roadwatch-core: shared data model for the Roadwatch hazard detection stack
//!
//! Holds the raw detector candidate type, the mapped detection type, and the
//! response contract (`DetectionReport`) shared by the HTTP server and the
//! manual test harness.

pub mod detection;

pub use detection::{best_detection, round_percent, Candidate, Detection, DetectionReport};
