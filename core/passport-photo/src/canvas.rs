#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PassportPhotoError;

/// Output width of a 35mm × 47mm document photo, in pixels.
pub const PASSPORT_WIDTH: u32 = 354;

/// Output height of a 35mm × 47mm document photo, in pixels.
pub const PASSPORT_HEIGHT: u32 = 472;

/// Margin added on every side of the detected face before cropping.
pub const DEFAULT_PADDING: u32 = 20;

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 4096;

/// Fixed-size target canvas and the face padding used to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanvasSpec {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Pixels added around the face box on each side.
    pub padding: u32,
}

impl CanvasSpec {
    /// The standard 354×472 passport canvas with 20px face padding.
    pub const fn passport() -> Self {
        Self {
            width: PASSPORT_WIDTH,
            height: PASSPORT_HEIGHT,
            padding: DEFAULT_PADDING,
        }
    }

    /// Reject canvases with no area or with a side above [`MAX_CANVAS_SIDE`].
    pub fn validate(&self) -> Result<(), PassportPhotoError> {
        let side_ok = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
        if !side_ok(self.width) || !side_ok(self.height) {
            return Err(PassportPhotoError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self::passport()
    }
}

/// Where a crop lands on the canvas.
///
/// The `scale`, `scaled_*` and `offset_*` fields are the exact geometry; the
/// `draw_*` fields are the same rectangle snapped to whole pixels, which is
/// what actually gets rasterized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPlacement {
    /// Uniform scale applied to the crop.
    pub scale: f64,
    /// Crop width after scaling.
    pub scaled_width: f64,
    /// Crop height after scaling.
    pub scaled_height: f64,
    /// Left margin on the canvas.
    pub offset_x: f64,
    /// Top margin on the canvas.
    pub offset_y: f64,
    /// Left edge of the drawn crop, in canvas pixels.
    pub draw_x: u32,
    /// Top edge of the drawn crop, in canvas pixels.
    pub draw_y: u32,
    /// Width of the drawn crop, in canvas pixels.
    pub draw_width: u32,
    /// Height of the drawn crop, in canvas pixels.
    pub draw_height: u32,
}

/// Scale a `crop_width` × `crop_height` region to fit inside the canvas
/// without distortion and center it.
///
/// The scale is `min(canvas.width / crop_width, canvas.height / crop_height)`,
/// so the limiting dimension spans the canvas edge to edge and the other one
/// is centered with equal margins.
pub fn fit_to_canvas(
    crop_width: u32,
    crop_height: u32,
    canvas: &CanvasSpec,
) -> Result<CanvasPlacement, PassportPhotoError> {
    if crop_width == 0 || crop_height == 0 {
        return Err(PassportPhotoError::DegenerateCrop {
            width: crop_width,
            height: crop_height,
        });
    }
    canvas.validate()?;

    let (target_w, target_h) = (canvas.width as f64, canvas.height as f64);
    let scale = (target_w / crop_width as f64).min(target_h / crop_height as f64);
    let scaled_width = crop_width as f64 * scale;
    let scaled_height = crop_height as f64 * scale;

    let draw_width = snap(scaled_width, canvas.width);
    let draw_height = snap(scaled_height, canvas.height);

    Ok(CanvasPlacement {
        scale,
        scaled_width,
        scaled_height,
        offset_x: ((target_w - scaled_width) / 2.0).max(0.0),
        offset_y: ((target_h - scaled_height) / 2.0).max(0.0),
        draw_x: (canvas.width - draw_width) / 2,
        draw_y: (canvas.height - draw_height) / 2,
        draw_width,
        draw_height,
    })
}

/// Round a scaled extent to whole pixels within `1..=limit`.
fn snap(extent: f64, limit: u32) -> u32 {
    (extent.round() as u32).clamp(1, limit)
}
