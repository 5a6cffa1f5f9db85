//! roadwatch-eye: vision layer for the Roadwatch hazard detection service
//!
//! Wraps a pretrained YOLO road-hazard model (ONNX) together with single-frame
//! USB camera capture, and exposes the Detection Responder used by the HTTP
//! server and the manual test harness. The detector and the camera are
//! capability traits so the responder can be exercised without model weights
//! or hardware.

pub mod camera;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod responder;

pub use camera::{Camera, UsbCamera};
pub use config::VisionConfig;
pub use detector::Detector;
pub use error::VisionError;
pub use models::{ModelManager, YoloDetector, HAZARD_CLASSES};
pub use responder::DetectionResponder;
