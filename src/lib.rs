//! Skin-tone detection from face photos.
//!
//! Samples skin pixels around face landmarks (or a band of the face box),
//! clusters them with k-means, picks the median-lightness cluster, and maps
//! its CIELAB value to a tone and undertone with a heuristic confidence.

pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod face;
pub mod pipeline;
pub mod tui;

pub use color::{rgb_to_lab, LabColor, PixelColor};
pub use config::DetectorConfig;
pub use error::{DetectionError, ErrorKind};
pub use face::{FaceDetector, FaceGeometry, ModelHandle};
pub use pipeline::detect::{DetectionResult, SkinToneDetector, Stage};
