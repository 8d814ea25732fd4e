use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use std::io::Cursor;

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader, Rgb, RgbImage};
use tracing::{debug, info, warn};

use crate::canvas::CanvasSpec;
use crate::compose::{compose, WHITE};
use crate::crop::padded_face_crop;
use crate::error::{ErrorKind, PassportPhotoError};
use crate::face_detector::FaceDetector;
use crate::{OutputFormat, PassportPhoto};

/// Where a pipeline run currently is.
///
/// Runs move strictly forward through
/// `Idle → Detecting → Cropping → Composing → Encoding → Done`; any stage may
/// instead end in `Failed`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Input accepted, image being decoded.
    Idle,
    /// Waiting on the face detector.
    Detecting,
    /// Computing the padded crop region.
    Cropping,
    /// Scaling the crop onto the canvas.
    Composing,
    /// Serializing the canvas.
    Encoding,
    /// Output produced.
    Done,
    /// The run stopped; no output was produced.
    Failed(ErrorKind),
}

impl PipelineStage {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Detecting => f.write_str("detecting"),
            Self::Cropping => f.write_str("cropping"),
            Self::Composing => f.write_str("composing"),
            Self::Encoding => f.write_str("encoding"),
            Self::Done => f.write_str("done"),
            Self::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}

/// Callback invoked on every stage transition.
pub type StageObserver = dyn FnMut(PipelineStage) + Send;

/// Tracks the current stage of one run and reports transitions.
pub(crate) struct StageTracker<'a> {
    stage: PipelineStage,
    observer: Option<&'a mut StageObserver>,
}

impl<'a> StageTracker<'a> {
    pub(crate) fn new(observer: Option<&'a mut StageObserver>) -> Self {
        Self {
            stage: PipelineStage::Idle,
            observer,
        }
    }

    pub(crate) fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn enter(&mut self, next: PipelineStage) {
        if self.stage.is_terminal() {
            return;
        }
        debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
        if let Some(observer) = self.observer.as_deref_mut() {
            observer(next);
        }
    }
}

/// Everything a run needs besides the input bytes and the detector.
#[derive(Debug, Clone)]
pub(crate) struct CropSettings {
    pub(crate) canvas: CanvasSpec,
    pub(crate) background: Rgb<u8>,
    pub(crate) filter: FilterType,
    pub(crate) format: OutputFormat,
    pub(crate) quality: f32,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSpec::passport(),
            background: WHITE,
            filter: FilterType::Lanczos3,
            format: OutputFormat::default(),
            quality: 0.9,
        }
    }
}

/// Decode input bytes into a `DynamicImage` in display orientation.
///
/// Phone cameras store pixels unrotated and record the rotation in the EXIF
/// Orientation tag; face boxes from a browser detector refer to the rotated
/// image, so the tag is applied here. Missing or unreadable orientation
/// metadata leaves the pixels as stored.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, PassportPhotoError> {
    let mut decoder = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| PassportPhotoError::DecodeError(e.to_string()))?
        .into_decoder()
        .map_err(|e| PassportPhotoError::DecodeError(e.to_string()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| PassportPhotoError::DecodeError(e.to_string()))?;
    if orientation != Orientation::NoTransforms {
        debug!(?orientation, "applying exif orientation");
        image.apply_orientation(orientation);
    }
    Ok(image)
}

/// Detect the input image format from the raw bytes.
pub(crate) fn detect_format(input: &[u8]) -> Result<ImageFormat, PassportPhotoError> {
    image::guess_format(input).map_err(|_| PassportPhotoError::UnsupportedFormat)
}

/// Encode the composited canvas.
pub(crate) fn encode_image(
    image: &RgbImage,
    format: &OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, PassportPhotoError> {
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PassportPhotoError::EncodeError(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            let quality_percent = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            JpegEncoder::new_with_quality(&mut buffer, quality_percent)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PassportPhotoError::EncodeError(e.to_string()))?;
        }
    }

    Ok(buffer)
}

/// Full pipeline: decode → detect → crop → compose → encode.
///
/// Every failure ends the run at the stage it happened in; nothing is
/// substituted for a missing face or a bad crop.
pub(crate) fn crop_pipeline(
    input: &[u8],
    detector: &dyn FaceDetector,
    settings: &CropSettings,
    tracker: &mut StageTracker<'_>,
) -> Result<PassportPhoto, PassportPhotoError> {
    let result = run_stages(input, detector, settings, tracker);
    match &result {
        Ok(photo) => {
            tracker.enter(PipelineStage::Done);
            info!(
                width = photo.width,
                height = photo.height,
                bytes = photo.data.len(),
                "passport photo ready"
            );
        }
        Err(err) => {
            if err.kind() == ErrorKind::NoFaceDetected {
                warn!("no face detected in input image");
            } else {
                debug!(stage = %tracker.stage(), error = %err, "pipeline failed");
            }
            tracker.enter(PipelineStage::Failed(err.kind()));
        }
    }
    result
}

fn run_stages(
    input: &[u8],
    detector: &dyn FaceDetector,
    settings: &CropSettings,
    tracker: &mut StageTracker<'_>,
) -> Result<PassportPhoto, PassportPhotoError> {
    let decoded = decode_image(input)?;
    let (source_width, source_height) = (decoded.width(), decoded.height());
    if source_width == 0 || source_height == 0 {
        return Err(PassportPhotoError::ZeroDimensions);
    }
    debug!(source_width, source_height, "decoded source image");

    tracker.enter(PipelineStage::Detecting);
    let gray = detector
        .needs_pixels()
        .then(|| image::imageops::grayscale(&decoded));
    let pixels: &[u8] = match &gray {
        Some(gray) => gray.as_raw(),
        None => &[],
    };
    let face = detector
        .detect(pixels, source_width, source_height)
        .ok_or(PassportPhotoError::NoFaceDetected)?;
    debug!(
        x = face.x,
        y = face.y,
        width = face.width,
        height = face.height,
        confidence = face.confidence,
        "face detected"
    );

    tracker.enter(PipelineStage::Cropping);
    let crop = padded_face_crop(&face, source_width, source_height, settings.canvas.padding);
    if crop.is_empty() {
        return Err(PassportPhotoError::DegenerateCrop {
            width: crop.width,
            height: crop.height,
        });
    }
    debug!(
        x = crop.x,
        y = crop.y,
        width = crop.width,
        height = crop.height,
        "crop region"
    );

    tracker.enter(PipelineStage::Composing);
    let (canvas, placement) = compose(
        &decoded,
        crop,
        &settings.canvas,
        settings.background,
        settings.filter,
    )?;

    tracker.enter(PipelineStage::Encoding);
    let data = encode_image(&canvas, &settings.format, settings.quality)?;

    Ok(PassportPhoto {
        data,
        format: settings.format.clone(),
        width: canvas.width(),
        height: canvas.height(),
        original_size: input.len(),
        face_bounds: face,
        crop,
        placement,
    })
}
