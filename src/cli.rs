use std::path::PathBuf;

use clap::Parser;

/// Detect skin tone, undertone and a confidence score from a face photo.
#[derive(Parser, Debug)]
#[command(name = "styllo-skin", version, about)]
pub struct Args {
    /// Path to the input image
    pub image: PathBuf,

    /// JSON face geometry (bounding box, optional landmarks) from a face
    /// detector; the whole frame is treated as the face if omitted
    #[arg(short, long)]
    pub face: Option<PathBuf>,

    /// JSON file overriding detector constants
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of K-means clusters
    #[arg(short = 'k', long = "clusters")]
    pub clusters: Option<usize>,

    /// Seed for cluster initialization (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimum number of skin pixels required
    #[arg(long)]
    pub min_pixels: Option<usize>,

    /// Also report the undertone
    #[arg(short, long)]
    pub detailed: bool,

    /// Print the result as JSON
    #[arg(long, conflicts_with = "tui")]
    pub json: bool,

    /// Print a colored swatch of the detected skin color
    #[arg(long)]
    pub preview: bool,

    /// Show the result in an interactive terminal view
    #[arg(long)]
    pub tui: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
