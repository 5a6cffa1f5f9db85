//! Binary for fetching detection weights from command line

use roadwatch_eye::config::{VisionConfig, DEFAULT_WEIGHTS_NAME};
use roadwatch_eye::error::VisionError;
use roadwatch_eye::models::manager::YOLO_V8N_URL;
use roadwatch_eye::models::ModelManager;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), VisionError> {
    let args: Vec<String> = env::args().collect();

    // Usage: fetch_model [url] [sha256]
    let url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or(YOLO_V8N_URL)
        .to_string();
    let checksum = args.get(2).map(|s| s.as_str()).unwrap_or("").to_string();

    let config = VisionConfig::default();
    let manager = ModelManager::new(Arc::new(config));

    println!("Fetching detection weights...");
    let path = manager
        .ensure_model(DEFAULT_WEIGHTS_NAME, &url, &checksum)
        .await?;
    println!("Weights ready at: {:?}", path);

    Ok(())
}
