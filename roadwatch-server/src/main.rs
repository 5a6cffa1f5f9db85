// Roadwatch - road hazard detection API server

use anyhow::bail;
use clap::Parser;
use roadwatch_eye::{DetectionResponder, UsbCamera, VisionConfig, YoloDetector};
use roadwatch_server::http::{create_router, ApiState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "roadwatch-server", about = "Road hazard detection API server")]
struct Args {
    /// Port to serve the HTTP API on
    #[arg(long, default_value_t = 5000, env = "ROADWATCH_PORT")]
    port: u16,

    /// Path to the trained ONNX weights (defaults to the fetched model location)
    #[arg(long, env = "ROADWATCH_MODEL")]
    model: Option<PathBuf>,

    /// USB camera device index for the stream endpoint
    #[arg(long, default_value_t = 0, env = "ROADWATCH_CAMERA")]
    camera: u32,

    /// Confidence threshold fraction
    #[arg(long, default_value_t = 0.5)]
    confidence: f32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let args = Args::parse();

    let mut config = VisionConfig::default();
    config.camera_id = args.camera;
    config.confidence_threshold = args.confidence;
    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }

    // An absent model aborts before serving begins
    let model_path = args.model.unwrap_or_else(|| config.weights_file());
    if !model_path.exists() {
        bail!(
            "Trained model not found at {:?}. Fetch weights first with: fetch_model",
            model_path
        );
    }

    info!("Loading model from {:?}", model_path);
    let detector = Arc::new(YoloDetector::load(&model_path, config.input_size)?);
    info!("Model loaded successfully");

    let state = ApiState {
        responder: Arc::new(DetectionResponder::new(
            detector,
            config.confidence_threshold,
        )),
        camera: Arc::new(UsbCamera::new(config.camera_id)),
    };
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);
    print_ready_message(args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("Roadwatch stopped");
    Ok(())
}

/// Print ready message
fn print_ready_message(port: u16) {
    println!();
    println!("Roadwatch API server ready at http://localhost:{}", port);
    println!("  POST /api/detect        - Detect in uploaded image");
    println!("  POST /api/detect/stream - Detect from camera");
    println!("  GET  /api/health        - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();
}

/// Wait for shutdown signal
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
