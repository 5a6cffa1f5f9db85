//! USB webcam capture

use crate::error::VisionError;
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};
use tracing::{debug, info};

/// Single-frame camera capability.
pub trait Camera: Send + Sync {
    /// Acquire the device, read exactly one frame, and release the device
    /// unconditionally before returning. No retry on a failed read.
    fn read_frame(&self) -> Result<RgbImage, VisionError>;
}

/// USB webcam backed by OpenCV videoio.
pub struct UsbCamera {
    device_index: u32,
}

impl UsbCamera {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl Camera for UsbCamera {
    fn read_frame(&self) -> Result<RgbImage, VisionError> {
        let mut capture = VideoCapture::new(self.device_index as i32, CAP_ANY).map_err(|e| {
            VisionError::Camera(format!("Failed to open camera {}: {}", self.device_index, e))
        })?;

        if !capture.is_opened().map_err(|e| {
            VisionError::Camera(format!("Camera {} not opened: {}", self.device_index, e))
        })? {
            let _ = capture.release();
            return Err(VisionError::Camera(format!(
                "Camera {} failed to open",
                self.device_index
            )));
        }

        let mut frame = Mat::default();
        let read_result = capture.read(&mut frame);
        // Release before inspecting the read result so the device is freed
        // even when the read failed.
        let _ = capture.release();

        let grabbed = read_result
            .map_err(|e| VisionError::Camera(format!("Failed to read frame: {}", e)))?;
        let empty = frame
            .empty()
            .map_err(|e| VisionError::Camera(format!("Failed to inspect frame: {}", e)))?;
        if !grabbed || empty {
            return Err(VisionError::Camera(
                "Failed to capture from camera".to_string(),
            ));
        }

        info!(
            "Captured {}x{} frame from camera {}",
            frame.cols(),
            frame.rows(),
            self.device_index
        );
        mat_to_rgb_image(&frame)
    }
}

/// Convert a BGR OpenCV frame to an RGB image buffer.
fn mat_to_rgb_image(frame: &Mat) -> Result<RgbImage, VisionError> {
    let (width, height) = (frame.cols(), frame.rows());
    if width <= 0 || height <= 0 {
        return Err(VisionError::Processing(
            "Invalid frame dimensions".to_string(),
        ));
    }

    let channels = frame.channels();
    if channels != 3 {
        return Err(VisionError::Processing(format!(
            "Unexpected channel count: {}",
            channels
        )));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .map_err(|e| VisionError::Processing(format!("Failed to convert color: {}", e)))?;

    let data = rgb
        .data_bytes()
        .map_err(|e| VisionError::Processing(format!("Failed to get frame data: {}", e)))?
        .to_vec();

    debug!("Converted frame to RGB buffer ({} bytes)", data.len());

    RgbImage::from_raw(width as u32, height as u32, data)
        .ok_or_else(|| VisionError::Processing("Frame buffer size mismatch".to_string()))
}
