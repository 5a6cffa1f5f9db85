//! Detection Responder: candidate list -> mapped detections

use crate::detector::Detector;
use crate::error::VisionError;
use image::RgbImage;
use roadwatch_core::Detection;
use std::sync::Arc;
use tracing::debug;

/// Runs the detector over a decoded frame and maps raw candidates to
/// human-readable detections.
///
/// Holds the process-lifetime detector behind `Arc` and a fixed confidence
/// threshold; no state is carried across calls.
pub struct DetectionResponder {
    detector: Arc<dyn Detector>,
    confidence_threshold: f32,
}

impl DetectionResponder {
    pub fn new(detector: Arc<dyn Detector>, confidence_threshold: f32) -> Self {
        Self {
            detector,
            confidence_threshold,
        }
    }

    /// Invoke the detector and map each candidate to a [`Detection`].
    ///
    /// Confidence is scaled to a 0-100 percentage rounded to 2 decimals and
    /// each detection gets its own wall-clock timestamp. A class id outside
    /// the model's label table is a processing error.
    pub fn respond(&self, image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        let candidates = self.detector.infer(image, self.confidence_threshold)?;
        let labels = self.detector.class_names();

        let mut detections = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let label = labels.get(candidate.class_id).ok_or_else(|| {
                VisionError::Processing(format!("Unknown class id {}", candidate.class_id))
            })?;
            detections.push(Detection::new(label.clone(), candidate.confidence));
        }

        debug!("Mapped {} detections", detections.len());
        Ok(detections)
    }

    pub fn class_names(&self) -> &[String] {
        self.detector.class_names()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}
