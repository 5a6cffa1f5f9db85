//! Model loading and lifecycle

pub mod manager;
pub mod yolo;

pub use manager::ModelManager;
pub use yolo::{YoloDetector, HAZARD_CLASSES};
