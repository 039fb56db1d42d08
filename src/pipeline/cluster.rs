use rand::seq::index;
use rand::Rng;

use crate::color::{channels_to_lab, LabColor, PixelColor};

/// One k-means cluster: a centroid on the 0-255 RGB scale and the pixels
/// assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelCluster {
    pub centroid: [f32; 3],
    pub members: Vec<PixelColor>,
}

impl PixelCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Centroid rounded to the nearest displayable pixel.
    pub fn centroid_pixel(&self) -> PixelColor {
        PixelColor::from_channels_clamped(self.centroid)
    }

    pub fn centroid_lab(&self) -> LabColor {
        channels_to_lab(self.centroid)
    }

    /// Mean squared RGB distance of members from the centroid.
    /// `None` for an empty cluster.
    pub fn mean_squared_distance(&self) -> Option<f32> {
        if self.members.is_empty() {
            return None;
        }
        let total: f64 = self
            .members
            .iter()
            .map(|p| squared_distance(p.channels(), self.centroid) as f64)
            .sum();
        Some((total / self.members.len() as f64) as f32)
    }
}

/// Result of a k-means run along with how it terminated.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub clusters: Vec<PixelCluster>,
    /// Assignment passes performed; never more than `max_iter`.
    pub passes: usize,
    /// True if a pass finished without any pixel changing cluster.
    pub converged: bool,
}

/// Partition pixels into `k` clusters by Euclidean distance in RGB.
///
/// See [`k_means_with_stats`].
pub fn k_means<R: Rng + ?Sized>(
    pixels: &[PixelColor],
    k: usize,
    max_iter: usize,
    rng: &mut R,
) -> Vec<PixelCluster> {
    k_means_with_stats(pixels, k, max_iter, rng).clusters
}

/// Lloyd's k-means with uniformly random, distinct initial centroids.
///
/// With fewer than `k` pixels each pixel becomes its own cluster. Otherwise
/// exactly `k` clusters are returned, some possibly empty; a cluster that
/// loses all members keeps its previous centroid. Every input pixel ends up
/// in exactly one cluster.
pub fn k_means_with_stats<R: Rng + ?Sized>(
    pixels: &[PixelColor],
    k: usize,
    max_iter: usize,
    rng: &mut R,
) -> Clustering {
    let k = k.max(1);
    if pixels.len() < k {
        return Clustering {
            clusters: pixels
                .iter()
                .map(|&p| PixelCluster {
                    centroid: p.channels(),
                    members: vec![p],
                })
                .collect(),
            passes: 0,
            converged: true,
        };
    }

    let mut centroids: Vec<[f32; 3]> = index::sample(rng, pixels.len(), k)
        .iter()
        .map(|i| pixels[i].channels())
        .collect();
    let mut assignments = vec![0usize; pixels.len()];
    let mut passes = 0;
    let mut converged = false;

    for _ in 0..max_iter {
        passes += 1;

        let mut changed = false;
        for (pixel, assigned) in pixels.iter().zip(assignments.iter_mut()) {
            let nearest = nearest_centroid(pixel.channels(), &centroids);
            if *assigned != nearest {
                *assigned = nearest;
                changed = true;
            }
        }

        if !changed {
            converged = true;
            break;
        }

        let mut sums = vec![[0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (pixel, &j) in pixels.iter().zip(&assignments) {
            let c = pixel.channels();
            for ch in 0..3 {
                sums[j][ch] += c[ch] as f64;
            }
            counts[j] += 1;
        }
        for j in 0..k {
            if counts[j] > 0 {
                let n = counts[j] as f64;
                centroids[j] = [
                    (sums[j][0] / n) as f32,
                    (sums[j][1] / n) as f32,
                    (sums[j][2] / n) as f32,
                ];
            }
        }
    }

    log::trace!("k-means: k={k} n={} passes={passes} converged={converged}", pixels.len());

    let mut members: Vec<Vec<PixelColor>> = vec![Vec::new(); k];
    for (pixel, &j) in pixels.iter().zip(&assignments) {
        members[j].push(*pixel);
    }

    Clustering {
        clusters: centroids
            .into_iter()
            .zip(members)
            .map(|(centroid, members)| PixelCluster { centroid, members })
            .collect(),
        passes,
        converged,
    }
}

/// Index of the closest centroid; ties go to the lower index.
fn nearest_centroid(point: [f32; 3], centroids: &[[f32; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (j, &c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_dist {
            best_dist = d;
            best = j;
        }
    }
    best
}

fn squared_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}
