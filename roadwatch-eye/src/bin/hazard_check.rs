//! Interactive manual test harness for the trained road-hazard model
//!
//! Loads the detector once, then offers single-image, folder, and live
//! webcam checks with per-detection percentage confidences.

use anyhow::{bail, Context};
use clap::Parser;
use roadwatch_core::Detection;
use roadwatch_eye::camera::{Camera, UsbCamera};
use roadwatch_eye::config::VisionConfig;
use roadwatch_eye::models::YoloDetector;
use roadwatch_eye::responder::DetectionResponder;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "hazard_check", about = "Manually test the road-hazard model")]
struct Args {
    /// Path to the ONNX weights (defaults to the fetched model location)
    #[arg(long)]
    model: Option<PathBuf>,

    /// USB camera device index for the webcam option
    #[arg(long, default_value_t = 0)]
    camera: u32,

    /// Confidence threshold fraction
    #[arg(long, default_value_t = 0.5)]
    confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    SingleImage,
    Folder,
    Webcam,
    Exit,
    Unknown,
}

fn parse_choice(input: &str) -> MenuChoice {
    match input.trim() {
        "1" => MenuChoice::SingleImage,
        "2" => MenuChoice::Folder,
        "3" => MenuChoice::Webcam,
        "4" => MenuChoice::Exit,
        _ => MenuChoice::Unknown,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = VisionConfig::default();
    let model_path = args.model.unwrap_or_else(|| config.weights_file());
    if !model_path.exists() {
        bail!(
            "Trained model not found at {:?}. Fetch it first with: fetch_model",
            model_path
        );
    }

    println!("Loading model from: {:?}", model_path);
    let detector = Arc::new(YoloDetector::load(&model_path, config.input_size)?);
    let responder = DetectionResponder::new(detector, args.confidence);
    println!("Model loaded successfully!");

    let stdin = io::stdin();
    loop {
        println!();
        println!("1. Test on single image");
        println!("2. Test on folder of images");
        println!("3. Test on webcam (live, Ctrl+C to stop)");
        println!("4. Exit");
        print!("\nEnter choice (1-4): ");
        io::stdout().flush()?;

        let mut choice = String::new();
        stdin.lock().read_line(&mut choice)?;

        match parse_choice(&choice) {
            MenuChoice::SingleImage => {
                let path = prompt(&stdin, "Enter image path: ")?;
                check_image(&responder, Path::new(path.trim()))?;
            }
            MenuChoice::Folder => {
                let path = prompt(&stdin, "Enter folder path: ")?;
                check_folder(&responder, Path::new(path.trim()))?;
            }
            MenuChoice::Webcam => {
                let camera = UsbCamera::new(args.camera);
                check_webcam(&responder, &camera);
            }
            MenuChoice::Exit => {
                println!("Exiting...");
                break;
            }
            MenuChoice::Unknown => {
                println!("Invalid choice, enter 1-4");
            }
        }
    }

    Ok(())
}

fn prompt(stdin: &io::Stdin, message: &str) -> anyhow::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line)
}

fn print_detections(detections: &[Detection]) {
    if detections.is_empty() {
        println!("   No hazards detected");
        return;
    }
    for detection in detections {
        println!(
            "   {}: {:.2}% confidence",
            detection.hazard_type.to_uppercase(),
            detection.confidence
        );
    }
}

fn check_image(responder: &DetectionResponder, path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!("Image not found: {:?}", path);
        return Ok(());
    }

    let image = image::open(path)
        .with_context(|| format!("Failed to decode {:?}", path))?
        .to_rgb8();
    let detections = responder.respond(&image)?;

    println!("\nDetections for {:?}:", path);
    print_detections(&detections);
    Ok(())
}

fn check_folder(responder: &DetectionResponder, folder: &Path) -> anyhow::Result<()> {
    if !folder.is_dir() {
        println!("Folder not found: {:?}", folder);
        return Ok(());
    }

    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        // Skip anything the image crate cannot decode (labels, notes, etc.)
        let image = match image::open(&path) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(_) => continue,
        };
        let detections = responder.respond(&image)?;
        println!("\n{:?}:", path);
        print_detections(&detections);
    }

    Ok(())
}

/// Live webcam loop. A capture or detection failure ends the loop and
/// returns to the menu rather than terminating the harness.
fn check_webcam(responder: &DetectionResponder, camera: &dyn Camera) {
    println!("Starting webcam detection...");

    loop {
        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                println!("Camera error: {}", e);
                return;
            }
        };

        let detections = match responder.respond(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                println!("Detection error: {}", e);
                return;
            }
        };

        if detections.is_empty() {
            println!("No hazards detected");
        } else {
            print_detections(&detections);
        }
    }
}
