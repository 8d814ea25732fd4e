use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Options for passport cropping, passed as a JavaScript object.
///
/// All fields are optional and fall back to the 354×472 PNG passport defaults.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CropOptions {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub padding: Option<u32>,
    pub background: Option<[u8; 3]>,
    pub format: Option<String>,
    pub quality: Option<f32>,
}

/// A face box as reported by a JavaScript detector such as face-api.js.
#[derive(Deserialize)]
pub struct FaceInput {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "full_confidence", alias = "score")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

/// Set while a crop is running; a second call is rejected rather than queued.
static BUSY: AtomicBool = AtomicBool::new(false);

/// Clears [`BUSY`] when the running crop finishes, however it finishes.
struct BusyGuard;

impl BusyGuard {
    fn acquire() -> Result<Self, JsValue> {
        if BUSY.swap(true, Ordering::AcqRel) {
            return Err(make_error("BUSY", "a passport photo is already being processed"));
        }
        Ok(BusyGuard)
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        BUSY.store(false, Ordering::Release);
    }
}

fn format_to_str(format: &passport_photo::OutputFormat) -> &'static str {
    match format {
        passport_photo::OutputFormat::Png => "png",
        passport_photo::OutputFormat::Jpeg => "jpeg",
    }
}

fn string_to_format(format: &str) -> Result<passport_photo::OutputFormat, JsValue> {
    match format {
        "png" => Ok(passport_photo::OutputFormat::Png),
        "jpeg" | "jpg" => Ok(passport_photo::OutputFormat::Jpeg),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown format: {format}"),
        )),
    }
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Machine-readable code for a `PassportPhotoError`.
///
/// Every way the input can fail to become an image shares `DECODE_ERROR`;
/// the message still tells them apart.
fn error_code(e: &passport_photo::PassportPhotoError) -> &'static str {
    use passport_photo::PassportPhotoError as E;
    match e {
        E::DecodeError(_) | E::UnsupportedFormat | E::ZeroDimensions => "DECODE_ERROR",
        E::NoFaceDetected => "NO_FACE_DETECTED",
        E::DegenerateCrop { .. } => "DEGENERATE_CROP",
        E::EncodeError(_) => "ENCODE_ERROR",
        E::ModelLoad(_) => "MODEL_LOAD_ERROR",
        E::NoDetector => "NO_DETECTOR",
        E::InvalidCanvas { .. } => "INVALID_CANVAS",
        E::InvalidQuality(_) => "INVALID_QUALITY",
    }
}

/// Convert a `PassportPhotoError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: passport_photo::PassportPhotoError) -> JsValue {
    make_error(error_code(&e), &e.to_string())
}

fn parse_options(options: JsValue) -> Result<CropOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(CropOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))
    }
}

fn parse_face(face: JsValue) -> Result<Option<passport_photo::FaceBounds>, JsValue> {
    if face.is_undefined() || face.is_null() {
        return Ok(None);
    }
    let face: FaceInput = serde_wasm_bindgen::from_value(face)
        .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid face box: {e}")))?;
    Ok(Some(passport_photo::FaceBounds {
        x: face.x,
        y: face.y,
        width: face.width,
        height: face.height,
        confidence: face.confidence,
    }))
}

/// Apply parsed `CropOptions` to a `PassportCropper`, returning the
/// configured cropper ready to run.
fn apply_options(
    mut cropper: passport_photo::PassportCropper,
    opts: &CropOptions,
) -> Result<passport_photo::PassportCropper, JsValue> {
    let mut canvas = passport_photo::CanvasSpec::passport();
    if let Some(width) = opts.canvas_width {
        canvas.width = width;
    }
    if let Some(height) = opts.canvas_height {
        canvas.height = height;
    }
    if let Some(padding) = opts.padding {
        canvas.padding = padding;
    }
    cropper = cropper.canvas(canvas);

    if let Some(rgb) = opts.background {
        cropper = cropper.background(passport_photo::Rgb(rgb));
    }
    if let Some(ref fmt) = opts.format {
        cropper = cropper.format(string_to_format(fmt)?);
    }
    if let Some(q) = opts.quality {
        cropper = cropper.quality(q);
    }
    Ok(cropper)
}

fn set_region(
    obj: &js_sys::Object,
    key: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<(), JsValue> {
    let region = js_sys::Object::new();
    js_sys::Reflect::set(&region, &"x".into(), &JsValue::from(x))?;
    js_sys::Reflect::set(&region, &"y".into(), &JsValue::from(y))?;
    js_sys::Reflect::set(&region, &"width".into(), &JsValue::from(width))?;
    js_sys::Reflect::set(&region, &"height".into(), &JsValue::from(height))?;
    js_sys::Reflect::set(obj, &key.into(), &region)?;
    Ok(())
}

/// Build a plain JS object from a `PassportPhoto`.
fn build_photo_object(photo: &passport_photo::PassportPhoto) -> Result<JsValue, JsValue> {
    let obj = js_sys::Object::new();
    let data = js_sys::Uint8Array::from(&photo.data[..]);
    js_sys::Reflect::set(&obj, &"data".into(), &data)?;
    js_sys::Reflect::set(
        &obj,
        &"format".into(),
        &JsValue::from_str(format_to_str(&photo.format)),
    )?;
    js_sys::Reflect::set(&obj, &"width".into(), &JsValue::from(photo.width))?;
    js_sys::Reflect::set(&obj, &"height".into(), &JsValue::from(photo.height))?;
    js_sys::Reflect::set(
        &obj,
        &"originalSize".into(),
        &JsValue::from(photo.original_size as u32),
    )?;
    js_sys::Reflect::set(
        &obj,
        &"fileName".into(),
        &JsValue::from_str(&photo.file_name()),
    )?;

    let crop = photo.crop;
    set_region(
        &obj,
        "crop",
        crop.x as f64,
        crop.y as f64,
        crop.width as f64,
        crop.height as f64,
    )?;

    let face = photo.face_bounds;
    set_region(&obj, "faceBounds", face.x, face.y, face.width, face.height)?;

    Ok(JsValue::from(obj))
}

/// Crop a passport photo around a face found by a JavaScript detector.
///
/// @param input - Raw image bytes (JPEG, PNG, WebP, ...)
/// @param face - `{x, y, width, height, score?}` in source pixels, or `null`
///   when the detector found nothing (throws `NO_FACE_DETECTED`)
/// @param options - Optional object with fields: canvasWidth, canvasHeight,
///   padding, background ([r, g, b]), format ("png" | "jpeg"), quality
#[wasm_bindgen(js_name = "cropPassportPhoto")]
pub fn crop_passport_photo(
    input: Vec<u8>,
    face: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let _busy = BusyGuard::acquire()?;

    let opts = parse_options(options)?;
    let face = parse_face(face)?;

    let cropper = passport_photo::PassportCropper::new(input).map_err(to_js_error)?;
    let cropper = apply_options(cropper, &opts)?
        .face_detector(Box::new(passport_photo::PrecomputedFace(face)));

    let result = cropper.run().map_err(to_js_error)?;

    build_photo_object(&result)
}

/// Whether a crop is currently running.
#[wasm_bindgen(js_name = "isBusy")]
pub fn is_busy() -> bool {
    BUSY.load(Ordering::Acquire)
}

/// Suggested download file name for the default output.
#[wasm_bindgen(js_name = "passportFileName")]
pub fn passport_file_name() -> String {
    passport_photo::OUTPUT_FILE_NAME.to_string()
}
