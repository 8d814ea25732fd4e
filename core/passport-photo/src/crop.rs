use crate::face_detector::FaceBounds;

/// Crop region within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// Left edge in source pixels.
    pub x: u32,
    /// Top edge in source pixels.
    pub y: u32,
    /// Width in source pixels.
    pub width: u32,
    /// Height in source pixels.
    pub height: u32,
}

impl CropRegion {
    /// Whether the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies entirely inside a `source_width` × `source_height` image.
    pub fn fits_within(&self, source_width: u32, source_height: u32) -> bool {
        self.x as u64 + self.width as u64 <= source_width as u64
            && self.y as u64 + self.height as u64 <= source_height as u64
    }

    /// Intersect the region with a `source_width` × `source_height` image.
    pub fn clamped_to(&self, source_width: u32, source_height: u32) -> CropRegion {
        let x = self.x.min(source_width);
        let y = self.y.min(source_height);
        CropRegion {
            x,
            y,
            width: self.width.min(source_width - x),
            height: self.height.min(source_height - y),
        }
    }
}

/// Expand a detected face by `padding` pixels on every side and clamp the
/// result to the source image.
///
/// Clamping is one-sided: padding lost at the left or top edge is dropped, not
/// moved to the opposite side, so a face near an edge ends up off-center in
/// the crop. Fractional detector coordinates are rounded to whole pixels.
///
/// A face lying entirely past the right or bottom edge yields an empty region.
pub fn padded_face_crop(
    face: &FaceBounds,
    source_width: u32,
    source_height: u32,
    padding: u32,
) -> CropRegion {
    let pad = padding as f64;

    let x = clamp_edge(face.x - pad, source_width);
    let y = clamp_edge(face.y - pad, source_height);
    let width = clamp_extent(face.width + 2.0 * pad, source_width - x);
    let height = clamp_extent(face.height + 2.0 * pad, source_height - y);

    CropRegion {
        x,
        y,
        width,
        height,
    }
}

/// Round a leading edge to a pixel in `0..=limit`.
fn clamp_edge(edge: f64, limit: u32) -> u32 {
    edge.round().max(0.0).min(limit as f64) as u32
}

/// Round an extent to whole pixels, capped at the room left before the far edge.
fn clamp_extent(extent: f64, room: u32) -> u32 {
    extent.round().max(0.0).min(room as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f64, y: f64, width: f64, height: f64) -> FaceBounds {
        FaceBounds {
            x,
            y,
            width,
            height,
            confidence: 0.99,
        }
    }

    #[test]
    fn interior_face_gets_full_padding() {
        let crop = padded_face_crop(&face(400.0, 300.0, 100.0, 150.0), 1000, 800, 20);
        assert_eq!(
            crop,
            CropRegion {
                x: 380,
                y: 280,
                width: 140,
                height: 190,
            }
        );
    }

    #[test]
    fn top_left_padding_is_truncated_not_redistributed() {
        // x' = -15 and y' = -10 clamp to 0; the lost margin is not added back
        let crop = padded_face_crop(&face(5.0, 10.0, 100.0, 150.0), 1000, 800, 20);
        assert_eq!(
            crop,
            CropRegion {
                x: 0,
                y: 0,
                width: 140,
                height: 190,
            }
        );
    }

    #[test]
    fn bottom_right_extent_is_clamped() {
        let crop = padded_face_crop(&face(900.0, 700.0, 90.0, 90.0), 1000, 800, 20);
        assert_eq!(crop.x, 880);
        assert_eq!(crop.y, 680);
        assert_eq!(crop.width, 120);
        assert_eq!(crop.height, 120);
        assert!(crop.fits_within(1000, 800));
    }

    #[test]
    fn face_larger_than_image_covers_whole_image() {
        let crop = padded_face_crop(&face(-50.0, -50.0, 500.0, 500.0), 200, 100, 20);
        assert_eq!(
            crop,
            CropRegion {
                x: 0,
                y: 0,
                width: 200,
                height: 100,
            }
        );
    }

    #[test]
    fn zero_padding_keeps_the_box() {
        let crop = padded_face_crop(&face(10.0, 20.0, 30.0, 40.0), 100, 100, 0);
        assert_eq!(
            crop,
            CropRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40,
            }
        );
    }

    #[test]
    fn fractional_coordinates_round_to_pixels() {
        let crop = padded_face_crop(&face(40.6, 30.2, 99.7, 120.4), 1000, 800, 20);
        assert_eq!(crop.x, 21);
        assert_eq!(crop.y, 10);
        assert_eq!(crop.width, 140);
        assert_eq!(crop.height, 160);
    }

    #[test]
    fn face_past_far_edge_is_empty() {
        let crop = padded_face_crop(&face(1200.0, 100.0, 50.0, 50.0), 1000, 800, 20);
        assert_eq!(crop.x, 1000);
        assert!(crop.is_empty());
        assert!(crop.fits_within(1000, 800));
    }

    #[test]
    fn bounds_hold_across_positions_and_sizes() {
        let sources = [(1u32, 1u32), (37, 91), (640, 480), (1000, 800)];
        for &(w, h) in &sources {
            for step in 0..=10 {
                let fx = (w as f64 * step as f64 / 10.0) - 15.0;
                let fy = (h as f64 * (10 - step) as f64 / 10.0) - 15.0;
                for &size in &[1.0, 25.0, 400.0] {
                    let crop = padded_face_crop(&face(fx, fy, size, size * 1.3), w, h, 20);
                    assert!(
                        crop.fits_within(w, h),
                        "{crop:?} escapes {w}x{h} for face at ({fx}, {fy})"
                    );
                }
            }
        }
    }

    #[test]
    fn clamped_to_intersects_with_image() {
        let region = CropRegion {
            x: 90,
            y: 5,
            width: 50,
            height: 500,
        };
        assert_eq!(
            region.clamped_to(100, 100),
            CropRegion {
                x: 90,
                y: 5,
                width: 10,
                height: 95,
            }
        );
    }
}
