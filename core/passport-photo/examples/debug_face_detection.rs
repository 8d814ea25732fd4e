//! Run the built-in SeetaFace detector over a few images and print the
//! detected face, the padded crop, and where it lands on the canvas.
//!
//! Usage:
//!   cargo run --example debug_face_detection --features rustface -- MODEL IMAGE...

use passport_photo::{fit_to_canvas, padded_face_crop, CanvasSpec, FaceDetector, RustfaceDetector};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let mut args = std::env::args().skip(1);
    let model_path = args
        .next()
        .expect("usage: debug_face_detection MODEL IMAGE...");
    let detector = RustfaceDetector::load(&model_path).expect("failed to load model");
    let canvas = CanvasSpec::passport();

    for path in args {
        let input = std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
        let image = image::load_from_memory(&input).unwrap();
        let gray = image::imageops::grayscale(&image);
        let (width, height) = (gray.width(), gray.height());

        println!("=== {path} ({width}x{height}) ===");

        let Some(face) = detector.detect(gray.as_raw(), width, height) else {
            println!("  NO FACE DETECTED");
            println!();
            continue;
        };
        println!(
            "  face: confidence={:.3}, bbox=({}, {}, {}x{})",
            face.confidence, face.x, face.y, face.width, face.height
        );

        let crop = padded_face_crop(&face, width, height, canvas.padding);
        println!(
            "  → padded crop: ({}, {}, {}x{})",
            crop.x, crop.y, crop.width, crop.height
        );

        match fit_to_canvas(crop.width, crop.height, &canvas) {
            Ok(p) => println!(
                "  → canvas: scale={:.3}, drawn at ({}, {}) as {}x{}",
                p.scale, p.draw_x, p.draw_y, p.draw_width, p.draw_height
            ),
            Err(e) => println!("  → {e}"),
        }
        println!();
    }
}
