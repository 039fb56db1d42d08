use rand::Rng;

use crate::color::{LabColor, PixelColor};
use crate::config::ClusteringConfig;
use crate::pipeline::cluster::{k_means, PixelCluster};

/// The cluster chosen as representative skin color.
#[derive(Debug, Clone)]
pub struct DominantColor {
    pub cluster: PixelCluster,
    /// LAB of the unrounded centroid.
    pub lab: LabColor,
    pub rgb: PixelColor,
}

/// Cluster the sampled pixels and pick the representative skin color.
///
/// Returns `None` only when there is nothing to cluster.
pub fn find_dominant_skin_color<R: Rng + ?Sized>(
    pixels: &[PixelColor],
    config: &ClusteringConfig,
    rng: &mut R,
) -> Option<DominantColor> {
    if pixels.is_empty() {
        return None;
    }
    let clusters = k_means(pixels, config.k, config.max_iter, rng);
    select_median_cluster(clusters)
}

/// Drop empty clusters, order the rest by LAB lightness, and take the one at
/// index `n / 2`. The darkest cluster tends to be shadow and the lightest
/// specular highlight.
pub fn select_median_cluster(clusters: Vec<PixelCluster>) -> Option<DominantColor> {
    let mut ranked: Vec<DominantColor> = clusters
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|cluster| DominantColor {
            lab: cluster.centroid_lab(),
            rgb: cluster.centroid_pixel(),
            cluster,
        })
        .collect();

    if ranked.is_empty() {
        return None;
    }

    ranked.sort_by(|a, b| a.lab.l.total_cmp(&b.lab.l));
    let mid = ranked.len() / 2;
    Some(ranked.swap_remove(mid))
}
