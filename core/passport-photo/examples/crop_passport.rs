//! Crop a passport photo around a face box found by some other detector.
//!
//! Usage:
//!   cargo run --example crop_passport -- INPUT X Y WIDTH HEIGHT [OUTPUT]
//!
//! Writes `passport.png` unless OUTPUT is given.

use passport_photo::{FaceBounds, PassportCropper, PrecomputedFace};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 5 {
        eprintln!("usage: crop_passport INPUT X Y WIDTH HEIGHT [OUTPUT]");
        std::process::exit(2);
    }

    let number = |i: usize| -> f64 {
        args[i]
            .parse()
            .unwrap_or_else(|e| panic!("argument {i} ({}) is not a number: {e}", args[i]))
    };
    let face = FaceBounds {
        x: number(1),
        y: number(2),
        width: number(3),
        height: number(4),
        confidence: 1.0,
    };

    let input = std::fs::read(&args[0]).unwrap_or_else(|e| panic!("failed to read {}: {e}", args[0]));
    let photo = match PassportCropper::new(input)
        .and_then(|c| c.face_detector(Box::new(PrecomputedFace(Some(face)))).run())
    {
        Ok(photo) => photo,
        Err(e) => {
            eprintln!("error ({}): {e}", e.kind());
            std::process::exit(1);
        }
    };

    let output = args.get(5).cloned().unwrap_or_else(|| photo.file_name());
    std::fs::write(&output, &photo.data).unwrap();
    println!(
        "{output}: {}x{} from crop ({}, {}, {}x{})",
        photo.width, photo.height, photo.crop.x, photo.crop.y, photo.crop.width, photo.crop.height
    );
}
