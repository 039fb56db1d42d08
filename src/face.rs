use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::DetectionError;

/// A 2-D image coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned face rectangle in image pixels. May extend past the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Named landmark point sets used to target skin regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Landmarks {
    pub left_cheek: Vec<Point>,
    pub right_cheek: Vec<Point>,
    pub nose_bridge: Vec<Point>,
    pub jaw_outline: Vec<Point>,
}

impl Landmarks {
    /// Derive the sampling sets from a 17-point jaw outline and a 9-point
    /// nose, as produced by 68-point landmark models.
    ///
    /// Cheeks are jaw points 1..6 and 10..15; the nose bridge is nose points
    /// from index 3 on. Shorter inputs yield whatever points exist.
    pub fn from_jaw_and_nose(jaw: &[Point], nose: &[Point]) -> Self {
        let slice = |points: &[Point], start: usize, end: usize| -> Vec<Point> {
            let end = end.min(points.len());
            let start = start.min(end);
            points[start..end].to_vec()
        };
        Self {
            left_cheek: slice(jaw, 1, 6),
            right_cheek: slice(jaw, 10, 15),
            nose_bridge: slice(nose, 3, nose.len()),
            jaw_outline: jaw.to_vec(),
        }
    }

    /// Points whose neighbourhoods are sampled for skin: both cheeks, then
    /// the nose bridge. The jaw outline itself is not sampled.
    pub fn sample_points(&self) -> impl Iterator<Item = &Point> {
        self.left_cheek
            .iter()
            .chain(&self.right_cheek)
            .chain(&self.nose_bridge)
    }

    pub fn has_sample_points(&self) -> bool {
        self.sample_points().next().is_some()
    }
}

/// What the face-detection collaborator reports for one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    pub bbox: BoundingBox,
    /// Detector score for this face.
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Landmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_probability: Option<f32>,
}

impl FaceGeometry {
    pub fn new(bbox: BoundingBox, score: f32) -> Self {
        Self {
            bbox,
            score,
            landmarks: None,
            age: None,
            gender: None,
            gender_probability: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Fraction of the frame covered by the bounding box.
    pub fn coverage(&self, frame_width: u32, frame_height: u32) -> f32 {
        let frame = frame_width as f32 * frame_height as f32;
        if frame <= 0.0 {
            return 0.0;
        }
        self.bbox.area() / frame
    }
}

/// Face-detection capability consumed by the pipeline.
pub trait FaceDetector {
    /// Locate the most prominent face, or `None` if there is none.
    fn detect(&self, image: &RgbImage) -> Option<FaceGeometry>;
}

impl<T: FaceDetector + ?Sized> FaceDetector for Box<T> {
    fn detect(&self, image: &RgbImage) -> Option<FaceGeometry> {
        (**self).detect(image)
    }
}

/// Reports the same precomputed geometry for every image.
///
/// Used to feed geometry produced by an external landmark model into the
/// pipeline, and as a mock in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    face: Option<FaceGeometry>,
}

impl StaticDetector {
    pub fn new(face: Option<FaceGeometry>) -> Self {
        Self { face }
    }

    /// Parse a JSON `FaceGeometry` object, or `null` for "no face".
    pub fn from_json(text: &str) -> Result<Self> {
        let face: Option<FaceGeometry> =
            serde_json::from_str(text).context("invalid face geometry JSON")?;
        Ok(Self { face })
    }

    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read face geometry: {}", path.display()))?;
        Self::from_json(&text)
    }
}

impl FaceDetector for StaticDetector {
    fn detect(&self, _image: &RgbImage) -> Option<FaceGeometry> {
        self.face.clone()
    }
}

/// Treats the entire frame as the face, without landmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullFrameDetector;

impl FaceDetector for FullFrameDetector {
    fn detect(&self, image: &RgbImage) -> Option<FaceGeometry> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let bbox = BoundingBox::new(0.0, 0.0, image.width() as f32, image.height() as f32);
        Some(FaceGeometry::new(bbox, 1.0))
    }
}

/// Lifecycle of a [`ModelHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// Caller-owned, lazily loaded face-detection model.
///
/// The first [`ensure_ready`](Self::ensure_ready) call runs the loader; every
/// concurrent or later caller awaits that same outcome. A failed load stays
/// failed.
pub struct ModelHandle<M> {
    cell: OnceCell<std::result::Result<M, String>>,
    /// Loader futures currently in flight.
    loading: AtomicUsize,
}

/// Marks a load as in flight until the loader finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<M> Default for ModelHandle<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ModelHandle<M> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            loading: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> ModelState {
        match self.cell.get() {
            Some(Ok(_)) => ModelState::Ready,
            Some(Err(_)) => ModelState::Failed,
            None if self.loading.load(Ordering::Acquire) > 0 => ModelState::Loading,
            None => ModelState::Uninitialized,
        }
    }

    /// The loaded model, if loading already succeeded.
    pub fn get(&self) -> Option<&M> {
        self.cell.get().and_then(|r| r.as_ref().ok())
    }

    /// Load the model on first use and wait for the shared outcome.
    ///
    /// Dropping this future before the load completes (for example through
    /// `tokio::time::timeout`) abandons that attempt; the handle returns to
    /// `Uninitialized` and the next caller loads again.
    pub async fn ensure_ready<F, Fut>(&self, load: F) -> std::result::Result<&M, DetectionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<M>>,
    {
        let outcome = self
            .cell
            .get_or_init(move || async move {
                let _in_flight = InFlight::enter(&self.loading);
                log::debug!("loading face detection model");
                let loaded = load().await.map_err(|e| format!("{e:#}"));
                if let Err(msg) = &loaded {
                    log::warn!("face detection model failed to load: {msg}");
                }
                loaded
            })
            .await;
        outcome
            .as_ref()
            .map_err(|msg| DetectionError::ModelLoadFailed(msg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Arc;

    fn jaw_points() -> Vec<Point> {
        (0..17).map(|i| Point::new(i as f32 * 10.0, 100.0)).collect()
    }

    fn nose_points() -> Vec<Point> {
        (0..9).map(|i| Point::new(80.0, 50.0 + i as f32 * 5.0)).collect()
    }

    // --- geometry tests ---

    #[test]
    fn landmarks_from_68_point_layout() {
        let jaw = jaw_points();
        let nose = nose_points();
        let lm = Landmarks::from_jaw_and_nose(&jaw, &nose);

        assert_eq!(lm.left_cheek, jaw[1..6].to_vec());
        assert_eq!(lm.right_cheek, jaw[10..15].to_vec());
        assert_eq!(lm.nose_bridge, nose[3..].to_vec());
        assert_eq!(lm.jaw_outline.len(), 17);
        assert_eq!(lm.sample_points().count(), 5 + 5 + 6);
    }

    #[test]
    fn landmarks_from_short_inputs() {
        let jaw: Vec<Point> = jaw_points().into_iter().take(3).collect();
        let lm = Landmarks::from_jaw_and_nose(&jaw, &[]);
        assert_eq!(lm.left_cheek.len(), 2);
        assert!(lm.right_cheek.is_empty());
        assert!(lm.nose_bridge.is_empty());
        assert!(lm.has_sample_points());

        assert!(!Landmarks::from_jaw_and_nose(&[], &[]).has_sample_points());
    }

    #[test]
    fn coverage_is_area_ratio() {
        let face = FaceGeometry::new(BoundingBox::new(10.0, 10.0, 50.0, 40.0), 0.9);
        let coverage = face.coverage(100, 100);
        assert!((coverage - 0.2).abs() < 1e-6, "got {coverage}");
        assert_eq!(face.coverage(0, 100), 0.0);
    }

    #[test]
    fn negative_box_dimensions_have_zero_area() {
        assert_eq!(BoundingBox::new(0.0, 0.0, -5.0, 10.0).area(), 0.0);
    }

    // --- detector tests ---

    #[test]
    fn static_detector_parses_json() {
        let json = r#"{
            "bbox": { "x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0 },
            "score": 0.8,
            "landmarks": { "left_cheek": [{ "x": 5.0, "y": 6.0 }] },
            "age": 31
        }"#;
        let detector = StaticDetector::from_json(json).unwrap();
        let face = detector.detect(&RgbImage::new(10, 10)).unwrap();
        assert_eq!(face.bbox.width, 30.0);
        assert_eq!(face.age, Some(31));
        let lm = face.landmarks.unwrap();
        assert_eq!(lm.left_cheek, vec![Point::new(5.0, 6.0)]);
        assert!(lm.right_cheek.is_empty());
    }

    #[test]
    fn static_detector_null_means_no_face() {
        let detector = StaticDetector::from_json("null").unwrap();
        assert!(detector.detect(&RgbImage::new(4, 4)).is_none());
    }

    #[test]
    fn static_detector_rejects_garbage() {
        assert!(StaticDetector::from_json("{ \"bbox\": 3 }").is_err());
    }

    #[test]
    fn full_frame_detector_covers_image() {
        let face = FullFrameDetector.detect(&RgbImage::new(64, 32)).unwrap();
        assert_eq!(face.bbox, BoundingBox::new(0.0, 0.0, 64.0, 32.0));
        assert!(face.landmarks.is_none());
        assert!((face.coverage(64, 32) - 1.0).abs() < 1e-6);
        assert!(FullFrameDetector.detect(&RgbImage::new(0, 0)).is_none());
    }

    // --- model handle tests ---

    #[tokio::test]
    async fn model_handle_loads_once_under_concurrency() {
        let handle: ModelHandle<u32> = ModelHandle::new();
        let calls = Arc::new(AtomicUsize::new(0));
        assert_eq!(handle.state(), ModelState::Uninitialized);

        let load = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, anyhow::Error>(42u32)
            }
        };

        let (a, b, c) = tokio::join!(
            handle.ensure_ready(load(calls.clone())),
            handle.ensure_ready(load(calls.clone())),
            handle.ensure_ready(load(calls.clone())),
        );
        assert_eq!(*a.unwrap(), 42);
        assert_eq!(*b.unwrap(), 42);
        assert_eq!(*c.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), ModelState::Ready);
        assert_eq!(handle.get(), Some(&42));
    }

    #[tokio::test]
    async fn model_handle_failure_is_sticky() {
        let handle: ModelHandle<u32> = ModelHandle::new();
        let err = handle
            .ensure_ready(|| async { Err(anyhow::anyhow!("weights missing")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoadFailed);
        assert!(err.to_string().contains("weights missing"));
        assert_eq!(handle.state(), ModelState::Failed);

        let again = handle.ensure_ready(|| async { Ok::<_, anyhow::Error>(1u32) }).await;
        assert!(again.is_err(), "failed load should not be retried");
        assert!(handle.get().is_none());
    }

    #[tokio::test]
    async fn model_handle_reports_loading_while_in_flight() {
        let handle: ModelHandle<u32> = ModelHandle::new();
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let load = handle.ensure_ready(|| async move {
            let _ = wait.await;
            Ok::<_, anyhow::Error>(5u32)
        });
        tokio::pin!(load);

        // Drive the loader until it parks on the channel
        assert!(poll_once(load.as_mut()).await.is_none());
        assert_eq!(handle.state(), ModelState::Loading);

        release.send(()).unwrap();
        assert_eq!(*load.await.unwrap(), 5);
        assert_eq!(handle.state(), ModelState::Ready);
    }

    #[tokio::test]
    async fn cancelled_load_returns_to_uninitialized() {
        let handle: ModelHandle<u32> = ModelHandle::new();
        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            handle.ensure_ready(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok::<_, anyhow::Error>(1u32)
            }),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(handle.state(), ModelState::Uninitialized);

        // The next caller runs its own loader
        let ready = handle.ensure_ready(|| async { Ok::<_, anyhow::Error>(2u32) }).await;
        assert_eq!(*ready.unwrap(), 2);
        assert_eq!(handle.state(), ModelState::Ready);
    }

    /// Poll a future once, returning its output if it completed.
    async fn poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(out) => Some(out),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }
}
