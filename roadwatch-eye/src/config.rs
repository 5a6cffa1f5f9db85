//! Configuration for roadwatch-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file name for the trained road-hazards weights (ONNX export).
pub const DEFAULT_WEIGHTS_NAME: &str = "road-hazards-v1.onnx";

/// Vision system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// USB camera device index (0, 1, 2, etc.)
    pub camera_id: u32,
    /// Camera resolution (width, height)
    pub resolution: (u32, u32),
    /// Minimum confidence fraction below which candidates are suppressed
    pub confidence_threshold: f32,
    /// Model input size (width, height)
    pub input_size: (u32, u32),
    /// Directory where model weights are stored
    pub model_path: PathBuf,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_path = dirs::home_dir()
            .map(|mut p| {
                p.push(".roadwatch");
                p.push("models");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models"));

        Self {
            camera_id: 0,
            resolution: (640, 480),
            confidence_threshold: 0.5,
            input_size: (640, 640),
            model_path,
        }
    }
}

impl VisionConfig {
    /// Path of the weights file inside the model directory
    pub fn weights_file(&self) -> PathBuf {
        self.model_path.join(DEFAULT_WEIGHTS_NAME)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence_threshold.is_finite()
            || self.confidence_threshold <= 0.0
            || self.confidence_threshold > 1.0
        {
            return Err("Confidence threshold must be in (0, 1]".to_string());
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err("Resolution must be non-zero".to_string());
        }

        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err("Resolution too large (max 8K)".to_string());
        }

        // Check for potential overflow in pixel calculations
        let total_pixels = self
            .resolution
            .0
            .checked_mul(self.resolution.1)
            .ok_or_else(|| "Resolution would cause integer overflow".to_string())?;

        if total_pixels > 100_000_000 {
            return Err("Resolution too large (max 100M pixels)".to_string());
        }

        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err("Model input size must be non-zero".to_string());
        }

        if self.input_size.0 > 4096 || self.input_size.1 > 4096 {
            return Err("Model input size too large (max 4096)".to_string());
        }

        if self.camera_id > 100 {
            return Err("Camera ID too large (max 100)".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.camera_id, 0);
        assert_eq!(config.resolution, (640, 480));
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.input_size, (640, 640));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_file_joins_model_path() {
        let mut config = VisionConfig::default();
        config.model_path = PathBuf::from("/tmp/models");
        assert_eq!(
            config.weights_file(),
            PathBuf::from("/tmp/models").join(DEFAULT_WEIGHTS_NAME)
        );
    }

    #[test]
    fn test_config_validation_threshold_out_of_range() {
        let mut config = VisionConfig::default();
        config.confidence_threshold = 0.0;
        assert!(config.validate().is_err());

        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        config.confidence_threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_resolution_zero() {
        let mut config = VisionConfig::default();
        config.resolution = (0, 480);
        assert!(config.validate().is_err());

        config.resolution = (640, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_resolution_too_large() {
        let mut config = VisionConfig::default();
        config.resolution = (7681, 4320);
        assert!(config.validate().is_err());

        config.resolution = (u32::MAX, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_input_size() {
        let mut config = VisionConfig::default();
        config.input_size = (0, 640);
        assert!(config.validate().is_err());

        config.input_size = (4097, 640);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_camera_id_too_large() {
        let mut config = VisionConfig::default();
        config.camera_id = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_edge_cases() {
        let mut config = VisionConfig::default();

        config.confidence_threshold = 1.0;
        config.resolution = (1, 1);
        config.camera_id = 100;
        assert!(config.validate().is_ok());
    }
}
