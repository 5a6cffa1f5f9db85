//! YOLO road-hazard detection model (ONNX)

use crate::detector::Detector;
use crate::error::VisionError;
use image::{imageops, RgbImage};
use ort::session::{Session, SessionOutputs};
use ort::value::Value;
use roadwatch_core::Candidate;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Road hazard class names, in the order the model was trained with.
pub const HAZARD_CLASSES: &[&str] = &[
    "debris",
    "pothole",
    "roadblock",
    "accident",
    "flood",
    "construction",
];

/// YOLO model for road hazard detection
pub struct YoloDetector {
    session: Arc<Mutex<Session>>,
    labels: Vec<String>,
    input_size: (u32, u32),
}

impl YoloDetector {
    /// Load the model with the default road-hazard label table.
    pub fn load(model_path: &Path, input_size: (u32, u32)) -> Result<Self, VisionError> {
        let labels = HAZARD_CLASSES.iter().map(|s| s.to_string()).collect();
        Self::load_with_labels(model_path, input_size, labels)
    }

    /// Load the model with an explicit label table.
    pub fn load_with_labels(
        model_path: &Path,
        input_size: (u32, u32),
        labels: Vec<String>,
    ) -> Result<Self, VisionError> {
        if labels.is_empty() {
            return Err(VisionError::Model("Label table is empty".to_string()));
        }

        ort::init().with_name("roadwatch-eye").commit();

        let session = Session::builder()
            .and_then(|builder| {
                builder.with_execution_providers([ort::ep::CPU::default().build()])
            })
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| VisionError::Ort(format!("Failed to load YOLO model: {}", e)))?;

        info!("YOLO model loaded from {:?}", model_path);

        Ok(Self {
            session: Arc::new(session),
            labels,
            input_size,
        })
    }

    /// Preprocess an RGB frame into a normalized NCHW input tensor.
    fn preprocess(&self, frame: &RgbImage) -> Result<Value, VisionError> {
        let (width, height) = self.input_size;

        // Prevent integer overflow in tensor sizing
        let total_size = 3usize
            .checked_mul(width as usize)
            .and_then(|v| v.checked_mul(height as usize))
            .ok_or_else(|| VisionError::Ort("Input shape would overflow".to_string()))?;

        if total_size > 100_000_000 {
            return Err(VisionError::Ort(
                "Input tensor too large (max 100M elements)".to_string(),
            ));
        }

        let resized = imageops::resize(frame, width, height, imageops::FilterType::Triangle);

        // HWC u8 -> CHW f32 normalized to [0, 1]
        let plane = (width as usize) * (height as usize);
        let mut chw = vec![0.0f32; total_size];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = (y as usize) * (width as usize) + (x as usize);
            chw[idx] = pixel[0] as f32 / 255.0;
            chw[plane + idx] = pixel[1] as f32 / 255.0;
            chw[2 * plane + idx] = pixel[2] as f32 / 255.0;
        }

        let input_shape = [1usize, 3, height as usize, width as usize];
        let input = Value::from_array(
            ort::ndarray::Array::from_shape_vec(input_shape, chw)
                .map_err(|e| VisionError::Ort(format!("Failed to create input array: {}", e)))?,
        )
        .map_err(|e| VisionError::Ort(format!("Failed to create input value: {}", e)))?;

        Ok(input)
    }

    /// Postprocess the YOLO output into threshold-filtered candidates.
    fn postprocess(
        &self,
        outputs: &[Value],
        confidence_threshold: f32,
    ) -> Result<Vec<Candidate>, VisionError> {
        if outputs.is_empty() {
            return Ok(vec![]);
        }

        let output_array = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Ort(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_array.shape();
        debug!("YOLO output shape: {:?}", shape);

        // Output format: [batch, num_detections, 5 + num_classes] where each
        // row is [x, y, w, h, objectness, class_probs...]
        if shape.len() < 3 {
            warn!("Unexpected YOLO output rank: {:?}", shape);
            return Ok(vec![]);
        }

        let num_rows = shape[1];
        let row_width = shape[2];
        let expected_width = 5 + self.labels.len();
        if row_width < expected_width {
            warn!(
                "YOLO output row width {} smaller than expected {}",
                row_width, expected_width
            );
            return Ok(vec![]);
        }

        let mut candidates = Vec::new();
        for i in 0..num_rows {
            let objectness = match output_array.get([0, i, 4]) {
                Some(v) => *v,
                None => break,
            };
            if !objectness.is_finite() || objectness < confidence_threshold {
                continue;
            }

            // Class with highest probability
            let mut max_class = 0usize;
            let mut max_prob = 0.0f32;
            for class_idx in 0..self.labels.len() {
                if let Some(prob) = output_array.get([0, i, 5 + class_idx]) {
                    if prob.is_finite() && *prob > max_prob {
                        max_prob = *prob;
                        max_class = class_idx;
                    }
                }
            }

            if max_prob >= confidence_threshold {
                candidates.push(Candidate::new(max_class, max_prob));
            }
        }

        debug!("YOLO produced {} candidates", candidates.len());
        Ok(candidates)
    }
}

impl Detector for YoloDetector {
    fn infer(
        &self,
        frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Candidate>, VisionError> {
        debug!("Running YOLO detection on {}x{} frame", frame.width(), frame.height());

        let input = self.preprocess(frame)?;
        let outputs = self
            .session
            .run(vec![input])
            .map_err(|e| VisionError::Ort(format!("YOLO inference failed: {}", e)))?;

        self.postprocess(&outputs, confidence_threshold)
    }

    fn class_names(&self) -> &[String] {
        &self.labels
    }
}
