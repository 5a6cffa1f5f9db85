// HTTP server with API routes for hazard detection

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use roadwatch_core::DetectionReport;
use roadwatch_eye::{Camera, DetectionResponder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const NO_HAZARDS_MESSAGE: &str = "No hazards detected";

// Uploaded frames are single camera stills; 20MB is generous
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared request state: the loaded model behind the responder and the
/// camera capability for the stream endpoint. Both are read-only for the
/// process lifetime.
#[derive(Clone)]
pub struct ApiState {
    pub responder: Arc<DetectionResponder>,
    pub camera: Arc<dyn Camera>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub classes: BTreeMap<String, String>,
}

/// Create HTTP router with all API routes
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/detect", post(detect_handler))
        .route("/api/detect/stream", post(detect_stream_handler))
        .route("/api/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bad_request(message: &str, code: &str) -> Response {
    let response = Json(ErrorResponse {
        error: message.to_string(),
        code: code.to_string(),
    });
    (StatusCode::BAD_REQUEST, response).into_response()
}

fn internal_error(message: String, code: &str) -> Response {
    let response = Json(ErrorResponse {
        error: message,
        code: code.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, response).into_response()
}

/// Detect hazards in an uploaded image (multipart field `image`)
async fn detect_handler(State(state): State<ApiState>, mut multipart: Multipart) -> Response {
    let mut image_bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("image") {
                    match field.bytes().await {
                        Ok(bytes) => {
                            image_bytes = Some(bytes);
                            break;
                        }
                        Err(e) => {
                            warn!("Failed to read image field: {}", e);
                            return bad_request("No image provided", "MISSING_IMAGE");
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return bad_request("No image provided", "MISSING_IMAGE");
            }
        }
    }

    let bytes = match image_bytes {
        Some(bytes) => bytes,
        None => return bad_request("No image provided", "MISSING_IMAGE"),
    };

    let image = match image::load_from_memory(&bytes) {
        Ok(decoded) => decoded.to_rgb8(),
        Err(e) => {
            error!("Failed to decode uploaded image: {}", e);
            return internal_error(e.to_string(), "DETECTION_ERROR");
        }
    };

    let responder = state.responder.clone();
    let detections = match tokio::task::spawn_blocking(move || responder.respond(&image)).await {
        Ok(Ok(detections)) => detections,
        Ok(Err(e)) => {
            error!("Detection failed: {}", e);
            return internal_error(e.to_string(), "DETECTION_ERROR");
        }
        Err(e) => {
            error!("Detection task failed: {}", e);
            return internal_error("Detection task failed".to_string(), "DETECTION_ERROR");
        }
    };

    let report = DetectionReport::with_all(detections, NO_HAZARDS_MESSAGE);
    if let DetectionReport::Detected {
        hazard_type,
        confidence,
        ..
    } = &report
    {
        info!("Detected: {} ({}%)", hazard_type, confidence);
    }

    (StatusCode::OK, Json(report)).into_response()
}

/// Detect hazards from one camera frame
async fn detect_stream_handler(State(state): State<ApiState>) -> Response {
    let camera = state.camera.clone();
    let frame = match tokio::task::spawn_blocking(move || camera.read_frame()).await {
        Ok(Ok(frame)) => frame,
        Ok(Err(e)) => {
            error!("Camera capture failed: {}", e);
            return internal_error("Failed to capture from camera".to_string(), "CAMERA_ERROR");
        }
        Err(e) => {
            error!("Camera task failed: {}", e);
            return internal_error("Failed to capture from camera".to_string(), "CAMERA_ERROR");
        }
    };

    let responder = state.responder.clone();
    let detections = match tokio::task::spawn_blocking(move || responder.respond(&frame)).await {
        Ok(Ok(detections)) => detections,
        Ok(Err(e)) => {
            error!("Detection failed: {}", e);
            return internal_error(e.to_string(), "DETECTION_ERROR");
        }
        Err(e) => {
            error!("Detection task failed: {}", e);
            return internal_error("Detection task failed".to_string(), "DETECTION_ERROR");
        }
    };

    let report = DetectionReport::best_only(detections);
    if let DetectionReport::Detected {
        hazard_type,
        confidence,
        ..
    } = &report
    {
        info!("Detected: {} ({}%)", hazard_type, confidence);
    }

    (StatusCode::OK, Json(report)).into_response()
}

/// Health check with the model's class table
async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let classes = state
        .responder
        .class_names()
        .iter()
        .enumerate()
        .map(|(id, label)| (id.to_string(), label.clone()))
        .collect();

    Json(HealthResponse {
        status: "running".to_string(),
        model: "loaded".to_string(),
        classes,
    })
}
