use std::future::Future;
use std::path::Path;

use image::RgbImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::color::{LabColor, PixelColor};
use crate::config::DetectorConfig;
use crate::error::DetectionError;
use crate::face::{FaceDetector, ModelHandle};
use crate::pipeline::classify::{classify_skin_tone, get_undertone, SkinTone, Undertone};
use crate::pipeline::confidence::{confidence_breakdown, ConfidenceBreakdown};
use crate::pipeline::dominant::find_dominant_skin_color;
use crate::pipeline::sample::{sample_face, SamplingMode};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    LoadImage,
    DetectFace,
    SamplePixels,
    ClusterSelect,
    Classify,
    ScoreConfidence,
    /// Reported once a result is ready; failures never reach it.
    Done,
}

impl Stage {
    /// Progress text for a UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::LoadImage => "Loading image...",
            Self::DetectFace => "Detecting face...",
            Self::SamplePixels => "Analyzing skin tone...",
            Self::ClusterSelect => "Finding dominant color...",
            Self::Classify => "Classifying...",
            Self::ScoreConfidence => "Scoring confidence...",
            Self::Done => "Done",
        }
    }
}

/// Outcome of one successful detection.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub tone: SkinTone,
    /// Only filled when the detector runs in detailed mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undertone: Option<Undertone>,
    pub confidence: f32,
    pub breakdown: ConfidenceBreakdown,
    pub lab: LabColor,
    pub rgb: PixelColor,
    /// Skin pixels sampled before clustering.
    pub pixel_count: usize,
    pub sampling: SamplingMode,
    pub face_detected: bool,
    pub face_coverage: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_probability: Option<f32>,
}

/// Runs image → face → skin pixels → dominant color → tone + confidence.
///
/// Holds only configuration; every call starts from scratch and shares no
/// pixel or cluster state with other calls.
#[derive(Debug, Clone, Default)]
pub struct SkinToneDetector {
    config: DetectorConfig,
}

impl SkinToneDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Decode an image file and analyze it.
    pub fn analyze_path<D: FaceDetector + ?Sized>(
        &self,
        path: &Path,
        detector: &D,
    ) -> Result<DetectionResult, DetectionError> {
        self.analyze_path_with_progress(path, detector, &mut |_: Stage| {})
    }

    pub fn analyze_path_with_progress<D: FaceDetector + ?Sized>(
        &self,
        path: &Path,
        detector: &D,
        on_stage: &mut dyn FnMut(Stage),
    ) -> Result<DetectionResult, DetectionError> {
        enter(Stage::LoadImage, on_stage);
        let image = load_image(path)?;
        self.run(&image, detector, on_stage)
    }

    /// Decode an in-memory encoded image (PNG, JPEG, ...) and analyze it.
    pub fn analyze_bytes<D: FaceDetector + ?Sized>(
        &self,
        bytes: &[u8],
        detector: &D,
    ) -> Result<DetectionResult, DetectionError> {
        self.analyze_bytes_with_progress(bytes, detector, &mut |_: Stage| {})
    }

    pub fn analyze_bytes_with_progress<D: FaceDetector + ?Sized>(
        &self,
        bytes: &[u8],
        detector: &D,
        on_stage: &mut dyn FnMut(Stage),
    ) -> Result<DetectionResult, DetectionError> {
        enter(Stage::LoadImage, on_stage);
        let image = image::load_from_memory(bytes)
            .map_err(|e| DetectionError::ImageLoadFailed(e.to_string()))?
            .to_rgb8();
        self.run(&image, detector, on_stage)
    }

    /// Analyze an already decoded frame.
    pub fn analyze_image<D: FaceDetector + ?Sized>(
        &self,
        image: &RgbImage,
        detector: &D,
    ) -> Result<DetectionResult, DetectionError> {
        self.run(image, detector, &mut |_: Stage| {})
    }

    /// Like [`analyze_image`](Self::analyze_image), reporting each stage to
    /// `on_stage` before it starts.
    pub fn analyze_image_with_progress<D: FaceDetector + ?Sized>(
        &self,
        image: &RgbImage,
        detector: &D,
        on_stage: &mut dyn FnMut(Stage),
    ) -> Result<DetectionResult, DetectionError> {
        self.run(image, detector, on_stage)
    }

    /// Wait for the face model to be ready, then analyze the frame.
    pub async fn analyze_with_model<M, F, Fut>(
        &self,
        image: &RgbImage,
        model: &ModelHandle<M>,
        load: F,
    ) -> Result<DetectionResult, DetectionError>
    where
        M: FaceDetector,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<M>>,
    {
        let detector = model.ensure_ready(load).await?;
        self.analyze_image(image, detector)
    }

    fn run<D: FaceDetector + ?Sized>(
        &self,
        image: &RgbImage,
        detector: &D,
        on_stage: &mut dyn FnMut(Stage),
    ) -> Result<DetectionResult, DetectionError> {
        let config = &self.config;

        enter(Stage::DetectFace, on_stage);
        let face = detector.detect(image).ok_or(DetectionError::NoFaceDetected)?;

        enter(Stage::SamplePixels, on_stage);
        let sample = sample_face(image, &face, &config.sampling);
        let pixel_count = sample.pixels.len();
        log::debug!("sampled {pixel_count} skin pixels ({:?})", sample.mode);
        if pixel_count < config.min_pixels {
            return Err(DetectionError::InsufficientPixels {
                found: pixel_count,
                required: config.min_pixels,
            });
        }

        enter(Stage::ClusterSelect, on_stage);
        let mut rng = match config.clustering.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dominant = find_dominant_skin_color(&sample.pixels, &config.clustering, &mut rng)
            .ok_or(DetectionError::ColorAnalysisFailed)?;

        enter(Stage::Classify, on_stage);
        let tone = classify_skin_tone(&dominant.lab);
        let undertone = config.detailed.then(|| get_undertone(&dominant.lab));

        enter(Stage::ScoreConfidence, on_stage);
        let face_coverage = face.coverage(image.width(), image.height());
        let breakdown =
            confidence_breakdown(&dominant.cluster, face_coverage, pixel_count, &config.confidence);

        log::debug!(
            "detected {tone} (L={:.1}, a={:.1}, b={:.1}) confidence {:.2}",
            dominant.lab.l,
            dominant.lab.a,
            dominant.lab.b,
            breakdown.confidence
        );

        enter(Stage::Done, on_stage);
        Ok(DetectionResult {
            tone,
            undertone,
            confidence: breakdown.confidence,
            breakdown,
            lab: dominant.lab,
            rgb: dominant.rgb,
            pixel_count,
            sampling: sample.mode,
            face_detected: true,
            face_coverage,
            age: face.age,
            gender: face.gender,
            gender_probability: face.gender_probability,
        })
    }
}

fn enter(stage: Stage, on_stage: &mut dyn FnMut(Stage)) {
    log::debug!("stage: {stage:?}");
    on_stage(stage);
}

/// Decode an image file into RGB.
pub fn load_image(path: &Path) -> Result<RgbImage, DetectionError> {
    let img = image::open(path).map_err(|e| {
        if !path.exists() {
            DetectionError::ImageLoadFailed(format!("file not found: {}", path.display()))
        } else {
            DetectionError::ImageLoadFailed(format!(
                "unsupported or corrupt image: {}: {e}",
                path.display()
            ))
        }
    })?;
    Ok(img.to_rgb8())
}
