//! Detector capability interface

use crate::error::VisionError;
use image::RgbImage;
use roadwatch_core::Candidate;

/// Black-box object detector.
///
/// Implemented by [`crate::models::YoloDetector`] in production and by stubs
/// in tests. Returned candidates are already filtered against the given
/// confidence threshold; class ids index into [`Detector::class_names`].
pub trait Detector: Send + Sync {
    /// Run inference over one decoded RGB frame.
    fn infer(
        &self,
        frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Candidate>, VisionError>;

    /// Class-id → label table owned by the model.
    fn class_names(&self) -> &[String];
}
