use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use tracing::debug;

use crate::canvas::{fit_to_canvas, CanvasPlacement, CanvasSpec};
use crate::crop::CropRegion;
use crate::error::PassportPhotoError;

/// Background used for letterbox/pillarbox bars and transparent pixels.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Cut `crop` out of `source`, scale it to fit the canvas, and paste it
/// centered over a solid `background`.
///
/// The output is always exactly `canvas.width` × `canvas.height`. A crop that
/// reaches past the source is intersected with it first; an empty crop is
/// rejected with [`PassportPhotoError::DegenerateCrop`].
pub fn compose(
    source: &DynamicImage,
    crop: CropRegion,
    canvas: &CanvasSpec,
    background: Rgb<u8>,
    filter: FilterType,
) -> Result<(RgbImage, CanvasPlacement), PassportPhotoError> {
    let crop = crop.clamped_to(source.width(), source.height());
    let placement = fit_to_canvas(crop.width, crop.height, canvas)?;

    let region = source.crop_imm(crop.x, crop.y, crop.width, crop.height);
    let region = flatten_alpha(&region, background);
    let scaled = imageops::resize(
        &region,
        placement.draw_width,
        placement.draw_height,
        filter,
    );

    let mut output = RgbImage::from_pixel(canvas.width, canvas.height, background);
    imageops::replace(
        &mut output,
        &scaled,
        placement.draw_x as i64,
        placement.draw_y as i64,
    );

    debug!(
        scale = placement.scale,
        draw_x = placement.draw_x,
        draw_y = placement.draw_y,
        draw_width = placement.draw_width,
        draw_height = placement.draw_height,
        "composited crop onto canvas"
    );

    Ok((output, placement))
}

/// Flatten alpha channel by compositing onto `background`.
pub(crate) fn flatten_alpha(image: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba: RgbaImage = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let [br, bg, bb] = background.0;
        let blend = |c: u8, back: u8| (c as f32 * alpha + back as f32 * inv_alpha).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(r, br), blend(g, bg), blend(b, bb)]));
    }

    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([200, 30, 30]);

    fn solid(width: u32, height: u32, color: Rgb<u8>) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, color))
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        DynamicImage::ImageRgb8(img)
    }

    fn region(x: u32, y: u32, width: u32, height: u32) -> CropRegion {
        CropRegion {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn output_is_always_canvas_sized() {
        let canvas = CanvasSpec::passport();
        for (w, h) in [(1, 1), (50, 500), (1000, 800), (354, 472)] {
            let (out, _) = compose(
                &gradient(w, h),
                region(0, 0, w, h),
                &canvas,
                WHITE,
                FilterType::Triangle,
            )
            .unwrap();
            assert_eq!(out.dimensions(), (354, 472), "source {w}x{h}");
        }
    }

    #[test]
    fn pillarbox_bars_are_background() {
        // 140x190 is slightly narrower than the canvas: 3px bars left and right
        let (out, placement) = compose(
            &solid(1000, 800, RED),
            region(380, 280, 140, 190),
            &CanvasSpec::passport(),
            WHITE,
            FilterType::Triangle,
        )
        .unwrap();
        assert_eq!(placement.draw_x, 3);
        assert_eq!(out.get_pixel(0, 236), &WHITE);
        assert_eq!(out.get_pixel(2, 236), &WHITE);
        assert_eq!(out.get_pixel(353, 236), &WHITE);
        assert_eq!(out.get_pixel(177, 0), &RED);
        assert_eq!(out.get_pixel(177, 471), &RED);
    }

    #[test]
    fn letterbox_bars_use_custom_background() {
        let grey = Rgb([220, 220, 220]);
        let (out, placement) = compose(
            &solid(300, 200, RED),
            region(0, 0, 300, 200),
            &CanvasSpec::passport(),
            grey,
            FilterType::Triangle,
        )
        .unwrap();
        assert_eq!(placement.draw_y, 118);
        assert_eq!(out.get_pixel(177, 0), &grey);
        assert_eq!(out.get_pixel(177, 117), &grey);
        assert_eq!(out.get_pixel(177, 236), &RED);
        assert_eq!(out.get_pixel(177, 354), &grey);
        assert_eq!(out.get_pixel(0, 200), &RED);
    }

    #[test]
    fn composing_twice_is_pixel_identical() {
        let source = gradient(640, 480);
        let crop = region(200, 100, 180, 240);
        let canvas = CanvasSpec::passport();
        let (first, _) = compose(&source, crop, &canvas, WHITE, FilterType::Lanczos3).unwrap();
        let (second, _) = compose(&source, crop, &canvas, WHITE, FilterType::Lanczos3).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn empty_crop_is_rejected() {
        let err = compose(
            &gradient(100, 100),
            region(100, 10, 20, 20),
            &CanvasSpec::passport(),
            WHITE,
            FilterType::Triangle,
        )
        .unwrap_err();
        assert!(matches!(err, PassportPhotoError::DegenerateCrop { .. }));
    }

    #[test]
    fn flatten_alpha_composites_over_background() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([255, 0, 0, 0]));
        let dynamic = DynamicImage::ImageRgba8(rgba);
        assert_eq!(flatten_alpha(&dynamic, WHITE).get_pixel(0, 0), &WHITE);
        assert_eq!(
            flatten_alpha(&dynamic, Rgb([0, 0, 255])).get_pixel(0, 0),
            &Rgb([0, 0, 255])
        );
    }

    #[test]
    fn flatten_alpha_preserves_opaque() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([100, 150, 200, 255]));
        let dynamic = DynamicImage::ImageRgba8(rgba);
        let rgb = flatten_alpha(&dynamic, WHITE);
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([100, 150, 200]));
    }

    #[test]
    fn flatten_alpha_blends_semitransparent() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([255, 0, 0, 128]));
        let dynamic = DynamicImage::ImageRgba8(rgba);
        let pixel = *flatten_alpha(&dynamic, WHITE).get_pixel(0, 0);
        assert!((pixel.0[0] as i16 - 255).abs() <= 1);
        assert!((pixel.0[1] as i16 - 127).abs() <= 2);
        assert!((pixel.0[2] as i16 - 127).abs() <= 2);
    }
}
