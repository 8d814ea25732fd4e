//! Passport photo cropping: find a face, crop around it with a margin, and
//! composite it onto a fixed 354×472 canvas without distorting it.
//!
//! # Example
//!
//! ```no_run
//! use passport_photo::{FaceBounds, PassportCropper, PrecomputedFace};
//!
//! let raw_bytes = std::fs::read("photo.jpg").unwrap();
//! let face = FaceBounds { x: 400.0, y: 300.0, width: 100.0, height: 150.0, confidence: 0.98 };
//! let photo = PassportCropper::new(raw_bytes)
//!     .unwrap()
//!     .face_detector(Box::new(PrecomputedFace(Some(face))))
//!     .run()
//!     .unwrap();
//! std::fs::write(photo.file_name(), &photo.data).unwrap();
//! ```
#![warn(missing_docs)]

mod canvas;
mod compose;
mod crop;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod pipeline;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

pub use canvas::{
    fit_to_canvas, CanvasPlacement, CanvasSpec, DEFAULT_PADDING, MAX_CANVAS_SIDE, PASSPORT_HEIGHT,
    PASSPORT_WIDTH,
};
pub use compose::{compose, WHITE};
pub use crop::{padded_face_crop, CropRegion};
/// Error type returned by passport-photo operations.
pub use error::{ErrorKind, PassportPhotoError};
/// Face detection trait and face bounding-box type.
pub use face_detector::{FaceBounds, FaceDetector, PrecomputedFace};
pub use image::imageops::FilterType;
pub use image::Rgb;
pub use pipeline::{PipelineStage, StageObserver};
#[cfg(feature = "rustface")]
/// Built-in detector backed by a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;

use pipeline::{crop_pipeline, CropSettings, StageTracker};

/// Stem of the suggested download file name.
pub const OUTPUT_FILE_STEM: &str = "passport";

/// Suggested download file name for the default PNG output.
pub const OUTPUT_FILE_NAME: &str = "passport.png";

/// Output image format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,

    /// JPEG at the configured quality.
    Jpeg,
}

impl OutputFormat {
    /// File extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// A finished passport photo.
#[derive(Debug, Clone)]
pub struct PassportPhoto {
    /// The encoded image bytes.
    pub data: Vec<u8>,

    /// The output format used.
    pub format: OutputFormat,

    /// Width of the output image in pixels.
    pub width: u32,

    /// Height of the output image in pixels.
    pub height: u32,

    /// Size of the original input in bytes.
    pub original_size: usize,

    /// The detected face, in source image coordinates.
    pub face_bounds: FaceBounds,

    /// The padded region cut from the source image.
    pub crop: CropRegion,

    /// Where the crop was drawn on the canvas.
    pub placement: CanvasPlacement,
}

impl PassportPhoto {
    /// Suggested file name, e.g. `passport.png`.
    pub fn file_name(&self) -> String {
        format!("{OUTPUT_FILE_STEM}.{}", self.format.extension())
    }
}

/// Run the crop pipeline with the standard passport settings: 354×472 PNG,
/// 20px face padding, white background.
///
/// Fails with [`PassportPhotoError::NoFaceDetected`] when `detector` finds no
/// face. No partial output is ever returned.
pub fn run_crop_pipeline(
    input: &[u8],
    detector: &dyn FaceDetector,
) -> Result<PassportPhoto, PassportPhotoError> {
    crop_pipeline(
        input,
        detector,
        &CropSettings::default(),
        &mut StageTracker::new(None),
    )
}

/// Builder for cropping passport photos.
///
/// Validates the input format on construction, then detects, crops,
/// composites and encodes on [`run`](Self::run).
pub struct PassportCropper {
    input: Vec<u8>,
    settings: CropSettings,
    /// User-provided face detector. When `None`, the built-in rustface backend is
    /// used (if compiled with the `rustface` feature).
    detector: Option<Box<dyn FaceDetector>>,
    observer: Option<Box<StageObserver>>,
}

impl PassportCropper {
    /// Create a new cropper from raw image bytes (JPEG, PNG, WebP, ...).
    pub fn new(input: Vec<u8>) -> Result<Self, PassportPhotoError> {
        pipeline::detect_format(&input)?;

        Ok(Self {
            input,
            settings: CropSettings::default(),
            detector: None,
            observer: None,
        })
    }

    /// Set the target canvas (default: [`CanvasSpec::passport`]).
    ///
    /// Each side must be within `1..=`[`MAX_CANVAS_SIDE`]; [`run`](Self::run)
    /// rejects anything else before decoding.
    pub fn canvas(mut self, canvas: CanvasSpec) -> Self {
        self.settings.canvas = canvas;
        self
    }

    /// Set the margin added around the face on every side (default: 20px).
    pub fn padding(mut self, padding: u32) -> Self {
        self.settings.canvas.padding = padding;
        self
    }

    /// Set the fill colour for the bars around the crop (default: white).
    pub fn background(mut self, color: Rgb<u8>) -> Self {
        self.settings.background = color;
        self
    }

    /// Set the resampling filter (default: Lanczos3).
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.settings.filter = filter;
        self
    }

    /// Set the output format (default: `OutputFormat::Png`).
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.settings.format = format;
        self
    }

    /// Set the JPEG quality from 0.0 (lowest) to 1.0 (highest).
    /// Default: 0.9. Ignored for PNG.
    pub fn quality(mut self, quality: f32) -> Self {
        self.settings.quality = quality;
        self
    }

    /// Provide a custom face detector implementation.
    ///
    /// ```no_run
    /// use passport_photo::{FaceBounds, FaceDetector, PassportCropper};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(&self, gray: &[u8], width: u32, height: u32) -> Option<FaceBounds> {
    ///         // Your detection logic here
    ///         None
    ///     }
    /// }
    ///
    /// let bytes = std::fs::read("photo.jpg").unwrap();
    /// let result = PassportCropper::new(bytes).unwrap()
    ///     .face_detector(Box::new(MyDetector))
    ///     .run();
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Register a callback that sees every stage transition of the run,
    /// e.g. to drive a busy indicator.
    pub fn on_stage(mut self, observer: impl FnMut(PipelineStage) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run the pipeline with the configured settings.
    pub fn run(mut self) -> Result<PassportPhoto, PassportPhotoError> {
        self.settings.canvas.validate()?;
        if !(0.0..=1.0).contains(&self.settings.quality) {
            return Err(PassportPhotoError::InvalidQuality(self.settings.quality));
        }

        let detector = match self.detector.take() {
            Some(detector) => detector,
            None => Self::default_detector()?,
        };

        let mut tracker = StageTracker::new(self.observer.as_deref_mut());
        crop_pipeline(&self.input, detector.as_ref(), &self.settings, &mut tracker)
    }

    #[cfg(feature = "rustface")]
    fn default_detector() -> Result<Box<dyn FaceDetector>, PassportPhotoError> {
        Ok(Box::new(RustfaceDetector::shared()?))
    }

    #[cfg(not(feature = "rustface"))]
    fn default_detector() -> Result<Box<dyn FaceDetector>, PassportPhotoError> {
        Err(PassportPhotoError::NoDetector)
    }
}
