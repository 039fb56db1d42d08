use image::{GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};

use crate::color::PixelColor;
use crate::config::SamplingConfig;
use crate::face::{BoundingBox, FaceGeometry, Landmarks};

/// Which strategy produced a pixel sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    Landmarks,
    BoundingBox,
}

/// Skin-candidate pixels gathered from one face.
#[derive(Debug, Clone)]
pub struct SkinSample {
    pub pixels: Vec<PixelColor>,
    pub mode: SamplingMode,
}

/// A rectangle fully inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Intersect the half-open span `[x0, x1) x [y0, y1)` with the image.
    /// Returns `None` when nothing is left.
    fn clipped(x0: i64, y0: i64, x1: i64, y1: i64, image: &RgbImage) -> Option<Self> {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(image.width() as i64);
        let y1 = y1.min(image.height() as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Sample skin pixels for a detected face, preferring landmarks and falling
/// back to the bounding-box band when there are none.
pub fn sample_face(image: &RgbImage, face: &FaceGeometry, config: &SamplingConfig) -> SkinSample {
    match &face.landmarks {
        Some(landmarks) if landmarks.has_sample_points() => SkinSample {
            pixels: sample_landmarks(image, landmarks, config),
            mode: SamplingMode::Landmarks,
        },
        _ => {
            log::debug!("no usable landmarks, sampling bounding-box band");
            SkinSample {
                pixels: sample_bbox(image, &face.bbox, config),
                mode: SamplingMode::BoundingBox,
            }
        }
    }
}

/// Half-width of the square window sampled around each landmark.
/// Scales with image width so sampling density tracks resolution.
pub fn window_radius(image_width: u32, config: &SamplingConfig) -> u32 {
    let scaled = (image_width as f32 * config.radius_fraction).round() as u32;
    scaled.max(config.min_radius)
}

/// Collect brightness-filtered pixels from a square window around every
/// cheek and nose-bridge landmark. Windows are clipped to the image; a window
/// with nothing left inside is skipped.
pub fn sample_landmarks(
    image: &RgbImage,
    landmarks: &Landmarks,
    config: &SamplingConfig,
) -> Vec<PixelColor> {
    let radius = window_radius(image.width(), config) as i64;
    let mut pixels = Vec::new();

    for point in landmarks.sample_points() {
        let cx = point.x.round() as i64;
        let cy = point.y.round() as i64;
        let Some(region) =
            Region::clipped(cx - radius, cy - radius, cx + radius, cy + radius, image)
        else {
            continue;
        };
        collect_region(image, region, config, &mut pixels);
    }

    pixels
}

/// Collect brightness-filtered pixels from the cheek band of the bounding box:
/// full box width, starting 30% down and spanning 45% of its height (by
/// default), which skips the eyes and mouth.
pub fn sample_bbox(image: &RgbImage, bbox: &BoundingBox, config: &SamplingConfig) -> Vec<PixelColor> {
    let x0 = bbox.x.round() as i64;
    let y0 = (bbox.y + bbox.height * config.band_top).round() as i64;
    let x1 = x0 + bbox.width.round() as i64;
    let y1 = y0 + (bbox.height * config.band_height).round() as i64;

    let mut pixels = Vec::new();
    if let Some(region) = Region::clipped(x0, y0, x1, y1, image) {
        collect_region(image, region, config, &mut pixels);
    }
    pixels
}

fn collect_region(image: &RgbImage, region: Region, config: &SamplingConfig, out: &mut Vec<PixelColor>) {
    let view = image.view(region.x, region.y, region.width, region.height);
    out.extend(
        view.pixels()
            .map(|(_, _, p)| PixelColor::from(p))
            .filter(|p| passes_brightness(*p, config)),
    );
}

/// Shadow and specular pixels bias the color estimate; keep the open interval.
fn passes_brightness(pixel: PixelColor, config: &SamplingConfig) -> bool {
    let brightness = pixel.brightness();
    brightness > config.min_brightness && brightness < config.max_brightness
}
