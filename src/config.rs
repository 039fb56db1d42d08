use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunable constants for the whole detection pipeline.
///
/// Every field has a default matching the calibrated values, so a config file
/// only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub sampling: SamplingConfig,
    pub clustering: ClusteringConfig,
    pub confidence: ConfidenceConfig,
    /// Fewer sampled pixels than this fails with `InsufficientPixels`.
    pub min_pixels: usize,
    /// Also compute the undertone for each result.
    pub detailed: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            clustering: ClusteringConfig::default(),
            confidence: ConfidenceConfig::default(),
            min_pixels: 50,
            detailed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Pixels with mean channel value at or below this are shadow.
    pub min_brightness: f32,
    /// Pixels with mean channel value at or above this are highlight.
    pub max_brightness: f32,
    /// Smallest half-width of a landmark window, in pixels.
    pub min_radius: u32,
    /// Landmark window half-width as a fraction of image width.
    pub radius_fraction: f32,
    /// Start of the bounding-box skin band, as a fraction of box height.
    pub band_top: f32,
    /// Height of the bounding-box skin band, as a fraction of box height.
    pub band_height: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            min_brightness: 30.0,
            max_brightness: 230.0,
            min_radius: 8,
            radius_fraction: 0.02,
            band_top: 0.30,
            band_height: 0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub k: usize,
    pub max_iter: usize,
    /// Fixed seed for centroid initialization; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 20,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub variance_weight: f32,
    pub coverage_weight: f32,
    pub sample_weight: f32,
    /// Mean squared RGB distance at which the tightness signal reaches zero.
    pub variance_norm: f32,
    /// Face-to-frame area ratio at which the coverage signal saturates.
    pub typical_face_coverage: f32,
    /// Sample count at which the sample-size signal saturates.
    pub plenty_pixels: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            variance_weight: 0.5,
            coverage_weight: 0.3,
            sample_weight: 0.2,
            variance_norm: 5000.0,
            typical_face_coverage: 0.2,
            plenty_pixels: 500,
        }
    }
}

impl DetectorConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        Ok(config)
    }
}
