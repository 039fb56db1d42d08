use serde::{Deserialize, Serialize};

use crate::color::LabColor;

/// Skin-tone category produced by the photo and live-capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinTone {
    Fair,
    Medium,
    Olive,
    Deep,
}

impl SkinTone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fair => "Fair",
            Self::Medium => "Medium",
            Self::Olive => "Olive",
            Self::Deep => "Deep",
        }
    }

    /// Parse a tone label, including the six-value form vocabulary.
    /// `Light` folds into `Fair` and `Dark` into `Deep`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "fair" | "light" => Some(Self::Fair),
            "medium" => Some(Self::Medium),
            "olive" => Some(Self::Olive),
            "deep" | "dark" => Some(Self::Deep),
            _ => None,
        }
    }
}

impl std::fmt::Display for SkinTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Undertone {
    Cool,
    Warm,
    Neutral,
}

impl std::fmt::Display for Undertone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Cool => "Cool",
            Self::Warm => "Warm",
            Self::Neutral => "Neutral",
        })
    }
}

/// Tone, undertone and the LAB value they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToneReport {
    pub tone: SkinTone,
    pub undertone: Undertone,
    pub lab: LabColor,
}

/// Map a LAB value to a tone by lightness. In the 40-55 band, low redness
/// with high yellowness reads as olive.
pub fn classify_skin_tone(lab: &LabColor) -> SkinTone {
    if lab.l > 70.0 {
        SkinTone::Fair
    } else if lab.l > 55.0 {
        SkinTone::Medium
    } else if lab.l > 40.0 {
        if lab.b > 15.0 && lab.a < 15.0 {
            SkinTone::Olive
        } else {
            SkinTone::Medium
        }
    } else {
        SkinTone::Deep
    }
}

pub fn get_undertone(lab: &LabColor) -> Undertone {
    if lab.a > 12.0 && lab.b < 18.0 {
        Undertone::Cool
    } else if lab.a < 10.0 && lab.b > 20.0 {
        Undertone::Warm
    } else {
        Undertone::Neutral
    }
}

pub fn classify_detailed(lab: &LabColor) -> ToneReport {
    ToneReport {
        tone: classify_skin_tone(lab),
        undertone: get_undertone(lab),
        lab: *lab,
    }
}
