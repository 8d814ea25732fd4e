use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::error::PassportPhotoError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Environment variable naming the SeetaFace model file used by
/// [`RustfaceDetector::shared`].
pub const MODEL_PATH_ENV: &str = "PASSPORT_PHOTO_MODEL";

/// Model location used when [`MODEL_PATH_ENV`] is not set.
pub const DEFAULT_MODEL_PATH: &str = "model/seeta_fd_frontal_v1.0.bin";

/// Process-wide model, loaded once and shared by every detector.
static MODEL: OnceLock<rustface::Model> = OnceLock::new();

/// Serializes loading so concurrent callers wait on one read of the file.
static LOADING: Mutex<()> = Mutex::new(());

/// Load the SeetaFace model into the process-wide slot, or return the one
/// already loaded.
///
/// Idempotent: the first successful call wins and later calls return the same
/// model regardless of `path`. Callers racing the first load block until it
/// finishes. A failed load leaves the slot empty so a later call may retry.
pub fn ensure_model_loaded(path: &Path) -> Result<&'static rustface::Model, PassportPhotoError> {
    load_once(&MODEL, &LOADING, || {
        let file = std::fs::File::open(path)
            .map_err(|e| PassportPhotoError::ModelLoad(format!("{}: {e}", path.display())))?;
        let model = rustface::read_model(std::io::BufReader::new(file))
            .map_err(|e| PassportPhotoError::ModelLoad(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded face detection model");
        Ok(model)
    })
}

/// Fill `slot` with the result of `load` unless it already holds a value.
///
/// `lock` admits one loader at a time; callers that queued behind a
/// successful load see the filled slot and skip their own. An `Err` from
/// `load` is returned as is and the slot stays empty.
fn load_once<T, E>(
    slot: &'static OnceLock<T>,
    lock: &Mutex<()>,
    load: impl FnOnce() -> Result<T, E>,
) -> Result<&'static T, E> {
    if let Some(value) = slot.get() {
        return Ok(value);
    }

    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(value) = slot.get() {
        return Ok(value);
    }

    let value = load()?;
    Ok(slot.get_or_init(|| value))
}

/// Whether the process-wide model has been loaded.
pub fn is_model_loaded() -> bool {
    MODEL.get().is_some()
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Wrap an already-loaded model.
    pub fn from_model(model: rustface::Model) -> Self {
        Self { model }
    }

    /// Read a model from raw bytes without touching the process-wide slot.
    pub fn from_bytes(model_data: &[u8]) -> Result<Self, PassportPhotoError> {
        let model = rustface::read_model(std::io::Cursor::new(model_data))
            .map_err(|e| PassportPhotoError::ModelLoad(e.to_string()))?;
        Ok(Self { model })
    }

    /// Detector over the process-wide model, loading it from `path` on first use.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PassportPhotoError> {
        let model = ensure_model_loaded(path.as_ref())?;
        Ok(Self {
            model: model.clone(),
        })
    }

    /// Detector over the process-wide model, located through
    /// [`MODEL_PATH_ENV`] or [`DEFAULT_MODEL_PATH`].
    pub fn shared() -> Result<Self, PassportPhotoError> {
        let path = std::env::var_os(MODEL_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        Self::load(path)
    }
}

/// Map an unbounded SeetaFace classifier score onto `[0, 1]`.
fn score_to_confidence(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Option<FaceBounds> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));
        debug!(candidates = faces.len(), "rustface detection finished");

        FaceBounds::most_confident(faces.iter().map(|face| {
            let bbox = face.bbox();
            FaceBounds {
                x: bbox.x() as f64,
                y: bbox.y() as f64,
                width: bbox.width() as f64,
                height: bbox.height() as f64,
                confidence: score_to_confidence(face.score()),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    #[test]
    fn concurrent_first_callers_share_one_load() {
        static SLOT: OnceLock<Vec<u8>> = OnceLock::new();
        static LOCK: Mutex<()> = Mutex::new(());
        const THREADS: usize = 8;

        let loads = AtomicUsize::new(0);
        let start = Barrier::new(THREADS);

        let results: Vec<&'static Vec<u8>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        start.wait();
                        load_once(&SLOT, &LOCK, || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok::<_, PassportPhotoError>(vec![1, 2, 3])
                        })
                        .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), THREADS);
        assert!(results.iter().all(|r| std::ptr::eq(*r, results[0])));
        assert_eq!(results[0], &vec![1, 2, 3]);
    }

    #[test]
    fn failed_load_is_not_cached() {
        static SLOT: OnceLock<u32> = OnceLock::new();
        static LOCK: Mutex<()> = Mutex::new(());

        let failed = load_once(&SLOT, &LOCK, || {
            Err(PassportPhotoError::ModelLoad("unreadable".into()))
        });
        assert!(matches!(failed, Err(PassportPhotoError::ModelLoad(_))));
        assert!(SLOT.get().is_none());

        let loaded = load_once(&SLOT, &LOCK, || Ok::<_, PassportPhotoError>(7)).unwrap();
        assert_eq!(*loaded, 7);

        let again = load_once(&SLOT, &LOCK, || -> Result<u32, PassportPhotoError> {
            panic!("slot already filled")
        })
        .unwrap();
        assert!(std::ptr::eq(loaded, again));
    }

    #[test]
    fn confidence_is_bounded_and_monotonic() {
        let low = score_to_confidence(-5.0);
        let mid = score_to_confidence(0.0);
        let high = score_to_confidence(12.0);
        assert!((0.0..=1.0).contains(&low));
        assert!((mid - 0.5).abs() < 1e-12);
        assert!(low < mid && mid < high && high <= 1.0);
    }

    #[test]
    fn ensure_model_loaded_reports_missing_path() {
        if is_model_loaded() {
            return;
        }
        let err = ensure_model_loaded(Path::new("/nonexistent/seeta.bin")).err();
        assert!(matches!(err, Some(PassportPhotoError::ModelLoad(_))));
        assert!(!is_model_loaded());
    }
}
