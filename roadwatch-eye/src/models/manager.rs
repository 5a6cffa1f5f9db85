//! Model manager with auto-download functionality
//!
//! Training happens in the upstream pipeline; this crate only fetches the
//! exported ONNX weights it produced.

use crate::config::VisionConfig;
use crate::error::VisionError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Bootstrap weights for smoke-testing the pipeline before the trained
/// road-hazards export is published.
pub const YOLO_V8N_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.2.0/yolov8n.onnx";

const MAX_MODEL_SIZE: usize = 2_000_000_000; // 2GB max
const DOWNLOAD_TIMEOUT_SECS: u64 = 3600; // 1 hour max

/// Model manager for downloading and managing detection weights
pub struct ModelManager {
    config: Arc<VisionConfig>,
}

impl ModelManager {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self { config }
    }

    /// Ensure the model directory exists
    pub fn ensure_model_dir(&self) -> Result<PathBuf, VisionError> {
        let model_path = &self.config.model_path;
        if !model_path.exists() {
            fs::create_dir_all(model_path)?;
            info!("Created model directory: {:?}", model_path);
        }
        Ok(model_path.clone())
    }

    /// Download the model if not present; returns the local weights path.
    ///
    /// `checksum` is an optional hex-encoded SHA-256 digest; pass "" to skip
    /// verification.
    pub async fn ensure_model(
        &self,
        model_name: &str,
        url: &str,
        checksum: &str,
    ) -> Result<PathBuf, VisionError> {
        if model_name.is_empty() || model_name.len() > 255 {
            return Err(VisionError::Model("Invalid model name".to_string()));
        }

        // Prevent path traversal
        if model_name.contains("..") || model_name.contains('/') || model_name.contains('\\') {
            return Err(VisionError::Model(
                "Model name contains invalid characters".to_string(),
            ));
        }

        if url.is_empty() || url.len() > 2048 {
            return Err(VisionError::Model("Invalid URL".to_string()));
        }

        // HTTPS only
        if !url.starts_with("https://") {
            return Err(VisionError::Model(
                "Only HTTPS URLs are allowed for model downloads".to_string(),
            ));
        }

        self.ensure_model_dir()?;

        let model_path = self.config.model_path.join(model_name);
        if model_path.exists() {
            info!("Model {} already exists at {:?}", model_name, model_path);
            return Ok(model_path);
        }

        info!("Downloading model {} from {}", model_name, url);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VisionError::Model(format!(
                "Failed to download model: HTTP {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_MODEL_SIZE as u64 {
                return Err(VisionError::Model(format!(
                    "Model too large: {} bytes (max {} bytes)",
                    content_length, MAX_MODEL_SIZE
                )));
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_MODEL_SIZE {
            return Err(VisionError::Model(format!(
                "Model too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_MODEL_SIZE
            )));
        }

        if !checksum.is_empty() {
            let digest = hex::encode(Sha256::digest(&bytes));
            if !digest.eq_ignore_ascii_case(checksum) {
                return Err(VisionError::Model(format!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    model_name, checksum, digest
                )));
            }
        }

        fs::write(&model_path, &bytes)?;
        info!(
            "Model {} downloaded to {:?} ({} bytes)",
            model_name,
            model_path,
            bytes.len()
        );

        Ok(model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Arc<VisionConfig> {
        let mut config = VisionConfig::default();
        config.model_path = dir.path().join("models");
        Arc::new(config)
    }

    #[test]
    fn test_ensure_model_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(config_in(&dir));
        let path = manager.ensure_model_dir().unwrap();
        assert!(path.exists());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_model_rejects_traversal_names() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(config_in(&dir));
        for name in ["../evil.onnx", "a/b.onnx", "a\\b.onnx", ""] {
            let result = manager.ensure_model(name, "https://example.com/m.onnx", "").await;
            assert!(matches!(result, Err(VisionError::Model(_))));
        }
    }

    #[tokio::test]
    async fn test_ensure_model_rejects_plain_http() {
        let dir = TempDir::new().unwrap();
        let manager = ModelManager::new(config_in(&dir));
        let result = manager
            .ensure_model("weights.onnx", "http://example.com/m.onnx", "")
            .await;
        assert!(matches!(result, Err(VisionError::Model(_))));
    }

    #[tokio::test]
    async fn test_ensure_model_skips_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let manager = ModelManager::new(config.clone());
        manager.ensure_model_dir().unwrap();

        let existing = config.model_path.join("weights.onnx");
        fs::write(&existing, b"fake weights").unwrap();

        // URL is never contacted when the file already exists
        let path = manager
            .ensure_model("weights.onnx", "https://invalid.invalid/m.onnx", "")
            .await
            .unwrap();
        assert_eq!(path, existing);
    }
}
