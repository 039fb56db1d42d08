use thiserror::Error;

/// Why a single detection attempt failed.
///
/// Every variant is an expected, user-correctable outcome: the caller should
/// ask for different input and try again. Nothing here is retried internally.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to load image: {0}")]
    ImageLoadFailed(String),

    #[error("no face detected")]
    NoFaceDetected,

    #[error("insufficient skin pixels: sampled {found}, need at least {required}")]
    InsufficientPixels { found: usize, required: usize },

    #[error("color analysis produced no usable cluster")]
    ColorAnalysisFailed,

    #[error("face detection model failed to load: {0}")]
    ModelLoadFailed(String),
}

/// Payload-free discriminant of [`DetectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ImageLoadFailed,
    NoFaceDetected,
    InsufficientPixels,
    ColorAnalysisFailed,
    ModelLoadFailed,
}

impl DetectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ImageLoadFailed(_) => ErrorKind::ImageLoadFailed,
            Self::NoFaceDetected => ErrorKind::NoFaceDetected,
            Self::InsufficientPixels { .. } => ErrorKind::InsufficientPixels,
            Self::ColorAnalysisFailed => ErrorKind::ColorAnalysisFailed,
            Self::ModelLoadFailed(_) => ErrorKind::ModelLoadFailed,
        }
    }

    /// Prompt text to show the person who supplied the photo.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::ImageLoadFailed => "Failed to load the image. Please try a different file.",
            ErrorKind::NoFaceDetected => {
                "No face detected. Please use a clear, well-lit photo of your face."
            }
            ErrorKind::InsufficientPixels => {
                "Could not analyze enough skin area. Try a closer photo with better lighting."
            }
            ErrorKind::ColorAnalysisFailed => "Color analysis failed. Please try a well-lit photo.",
            ErrorKind::ModelLoadFailed => "Failed to load AI models. Please refresh.",
        }
    }
}
