/// Bounding box of a detected face within an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
}

impl FaceBounds {
    /// Pick the highest-confidence face from a set of candidates.
    ///
    /// Detection engines that report several faces can use this to satisfy
    /// the single-face contract of [`FaceDetector::detect`].
    pub fn most_confident<I>(faces: I) -> Option<FaceBounds>
    where
        I: IntoIterator<Item = FaceBounds>,
    {
        faces.into_iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Pluggable face detection backend.
///
/// Implementations return at most one face: when the engine sees several,
/// resolving them to the single highest-confidence detection is the
/// detector's job, not the pipeline's. `None` means no face was found.
pub trait FaceDetector: Send + Sync {
    /// Detect a face in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Option<FaceBounds>;

    /// Whether [`detect`](Self::detect) reads the grayscale buffer.
    ///
    /// When `false` the pipeline passes an empty buffer (still with the
    /// source `width` and `height`) instead of converting the image.
    fn needs_pixels(&self) -> bool {
        true
    }
}

/// A detector that replays a detection computed elsewhere.
///
/// Useful when detection already ran outside this crate, e.g. in a browser
/// model, and only the crop geometry should happen here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedFace(pub Option<FaceBounds>);

impl FaceDetector for PrecomputedFace {
    fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Option<FaceBounds> {
        self.0
    }

    fn needs_pixels(&self) -> bool {
        false
    }
}
