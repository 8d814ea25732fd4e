use thiserror::Error;

/// Everything that can stop a crop run.
#[derive(Debug, Error)]
pub enum PassportPhotoError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("no face detected; try uploading a clearer or larger image")]
    NoFaceDetected,

    #[error("crop region has zero area ({width}x{height})")]
    DegenerateCrop { width: u32, height: u32 },

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("failed to load face detection model: {0}")]
    ModelLoad(String),

    #[error("no face detector configured")]
    NoDetector,

    #[error(
        "canvas sides must be between 1 and {} pixels, got {width}x{height}",
        crate::canvas::MAX_CANVAS_SIDE
    )]
    InvalidCanvas { width: u32, height: u32 },

    #[error("quality must be between 0.0 and 1.0, got {0}")]
    InvalidQuality(f32),
}

/// Coarse classification of a [`PassportPhotoError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input bytes could not be turned into a raster image.
    ImageDecode,
    /// The detector found no face.
    NoFaceDetected,
    /// The computed crop region has zero width or height.
    DegenerateCrop,
    /// The composited canvas could not be serialized.
    Encode,
    /// The detection model could not be loaded.
    ModelLoad,
    /// The pipeline was configured with invalid parameters.
    InvalidConfig,
}

impl PassportPhotoError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DecodeError(_) | Self::UnsupportedFormat | Self::ZeroDimensions => {
                ErrorKind::ImageDecode
            }
            Self::NoFaceDetected => ErrorKind::NoFaceDetected,
            Self::DegenerateCrop { .. } => ErrorKind::DegenerateCrop,
            Self::EncodeError(_) => ErrorKind::Encode,
            Self::ModelLoad(_) => ErrorKind::ModelLoad,
            Self::NoDetector | Self::InvalidCanvas { .. } | Self::InvalidQuality(_) => {
                ErrorKind::InvalidConfig
            }
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ImageDecode => "image decode",
            Self::NoFaceDetected => "no face detected",
            Self::DegenerateCrop => "degenerate crop",
            Self::Encode => "encode",
            Self::ModelLoad => "model load",
            Self::InvalidConfig => "invalid config",
        };
        f.write_str(name)
    }
}
