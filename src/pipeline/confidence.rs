use serde::Serialize;

use crate::config::ConfidenceConfig;
use crate::pipeline::cluster::PixelCluster;

/// The three confidence signals, each in [0, 1], and their weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    /// Cluster tightness.
    pub variance_score: f32,
    /// Face size relative to the frame.
    pub coverage_score: f32,
    /// Amount of usable skin sampled.
    pub sample_score: f32,
    /// Weighted sum, clamped to [0, 1] and rounded to two decimals.
    pub confidence: f32,
}

/// Heuristic [0, 1] trust score for a detection.
pub fn calculate_confidence(
    cluster: &PixelCluster,
    face_coverage: f32,
    total_pixels: usize,
    config: &ConfidenceConfig,
) -> f32 {
    confidence_breakdown(cluster, face_coverage, total_pixels, config).confidence
}

pub fn confidence_breakdown(
    cluster: &PixelCluster,
    face_coverage: f32,
    total_pixels: usize,
    config: &ConfidenceConfig,
) -> ConfidenceBreakdown {
    // An empty cluster has unbounded spread.
    let variance_score = match cluster.mean_squared_distance() {
        Some(variance) if config.variance_norm > 0.0 => {
            (1.0 - variance / config.variance_norm).max(0.0)
        }
        _ => 0.0,
    };

    let coverage_score = if config.typical_face_coverage > 0.0 {
        (face_coverage.max(0.0) / config.typical_face_coverage).min(1.0)
    } else {
        1.0
    };

    let sample_score = if config.plenty_pixels > 0 {
        (total_pixels as f32 / config.plenty_pixels as f32).min(1.0)
    } else {
        1.0
    };

    let weighted = variance_score * config.variance_weight
        + coverage_score * config.coverage_weight
        + sample_score * config.sample_weight;
    let confidence = ((weighted * 100.0).round() / 100.0).clamp(0.0, 1.0);

    ConfidenceBreakdown {
        variance_score,
        coverage_score,
        sample_score,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PixelColor;

    fn uniform_cluster(n: usize) -> PixelCluster {
        let p = PixelColor::new(200, 160, 130);
        PixelCluster {
            centroid: p.channels(),
            members: vec![p; n],
        }
    }

    fn spread_cluster() -> PixelCluster {
        PixelCluster {
            centroid: [50.0, 0.0, 0.0],
            members: vec![PixelColor::new(0, 0, 0), PixelColor::new(100, 0, 0)],
        }
    }

    #[test]
    fn ideal_detection_scores_one() {
        let config = ConfidenceConfig::default();
        assert_eq!(calculate_confidence(&uniform_cluster(600), 0.5, 600, &config), 1.0);
    }

    #[test]
    fn known_mixture_of_signals() {
        let config = ConfidenceConfig::default();
        let b = confidence_breakdown(&spread_cluster(), 0.1, 250, &config);
        assert!((b.variance_score - 0.5).abs() < 1e-6);
        assert!((b.coverage_score - 0.5).abs() < 1e-6);
        assert!((b.sample_score - 0.5).abs() < 1e-6);
        // 0.25 + 0.15 + 0.10
        assert_eq!(b.confidence, 0.5);
    }

    #[test]
    fn result_has_two_decimals() {
        let config = ConfidenceConfig::default();
        let c = calculate_confidence(&uniform_cluster(10), 0.0333, 77, &config);
        assert_eq!(c, (c * 100.0).round() / 100.0);
        // 0.5 + 0.3 * 0.1665 + 0.2 * 0.154 = 0.58075
        assert_eq!(c, 0.58);
    }

    #[test]
    fn empty_cluster_gets_no_variance_credit() {
        let config = ConfidenceConfig::default();
        let empty = PixelCluster {
            centroid: [0.0; 3],
            members: Vec::new(),
        };
        let b = confidence_breakdown(&empty, 1.0, 1000, &config);
        assert_eq!(b.variance_score, 0.0);
        assert_eq!(b.confidence, 0.5);
    }

    #[test]
    fn very_loose_cluster_floors_at_zero() {
        let config = ConfidenceConfig::default();
        let loose = PixelCluster {
            centroid: [127.5, 127.5, 127.5],
            members: vec![PixelColor::new(0, 0, 0), PixelColor::new(255, 255, 255)],
        };
        let b = confidence_breakdown(&loose, 0.0, 0, &config);
        assert_eq!(b.variance_score, 0.0);
        assert_eq!(b.confidence, 0.0);
    }

    #[test]
    fn constants_are_configurable() {
        let config = ConfidenceConfig {
            plenty_pixels: 100,
            typical_face_coverage: 0.5,
            ..ConfidenceConfig::default()
        };
        let b = confidence_breakdown(&uniform_cluster(100), 0.25, 100, &config);
        assert_eq!(b.sample_score, 1.0);
        assert!((b.coverage_score - 0.5).abs() < 1e-6);
    }
}
