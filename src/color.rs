use palette::Lab;
use serde::{Deserialize, Serialize};

/// CIELAB color (D65 white point). `l` is in [0, 100]; `a` and `b` are
/// unbounded but stay roughly within [-128, 127] for sRGB input.
pub type LabColor = Lab;

// D65 reference white.
const XN: f32 = 0.95047;
const YN: f32 = 1.0;
const ZN: f32 = 1.08883;

const LAB_EPSILON: f32 = 0.008856;

/// An sRGB pixel sampled from an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels, in [0, 255].
    pub fn brightness(self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }

    pub fn channels(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Convert to CIELAB.
    pub fn to_lab(self) -> LabColor {
        rgb_to_lab(self.r, self.g, self.b)
    }

    /// Serialize to lowercase hex `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Round and clamp floating-point channels (0-255 scale) to a pixel.
    pub fn from_channels_clamped(channels: [f32; 3]) -> Self {
        let to_u8 = |c: f32| c.round().clamp(0.0, 255.0) as u8;
        Self {
            r: to_u8(channels[0]),
            g: to_u8(channels[1]),
            b: to_u8(channels[2]),
        }
    }
}

impl From<image::Rgb<u8>> for PixelColor {
    fn from(p: image::Rgb<u8>) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl std::fmt::Display for PixelColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Convert 8-bit sRGB to CIELAB.
///
/// Linearizes each channel, projects onto XYZ with the sRGB primaries, then
/// applies the CIE nonlinearity against the D65 white.
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> LabColor {
    channels_to_lab([r as f32, g as f32, b as f32])
}

/// Same as [`rgb_to_lab`] for fractional channels on the 0-255 scale
/// (k-means centroids are not whole numbers).
pub fn channels_to_lab(rgb: [f32; 3]) -> LabColor {
    fn linearize(c: f32) -> f32 {
        let c = c / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    fn f(t: f32) -> f32 {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    }

    let lr = linearize(rgb[0]);
    let lg = linearize(rgb[1]);
    let lb = linearize(rgb[2]);

    let x = lr * 0.4124564 + lg * 0.3575761 + lb * 0.1804375;
    let y = lr * 0.2126729 + lg * 0.7151522 + lb * 0.0721750;
    let z = lr * 0.0193339 + lg * 0.1191920 + lb * 0.9503041;

    let fx = f(x / XN);
    let fy = f(y / YN);
    let fz = f(z / ZN);

    Lab::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::{IntoColor, Srgb};

    const BLACK: PixelColor = PixelColor { r: 0, g: 0, b: 0 };
    const WHITE: PixelColor = PixelColor {
        r: 255,
        g: 255,
        b: 255,
    };

    #[test]
    fn black_has_zero_lightness() {
        let lab = BLACK.to_lab();
        assert!(lab.l.abs() < 1e-4, "L of black should be 0, got {}", lab.l);
        assert!(lab.a.abs() < 1e-4);
        assert!(lab.b.abs() < 1e-4);
    }

    #[test]
    fn white_is_neutral_full_lightness() {
        let lab = WHITE.to_lab();
        assert!((lab.l - 100.0).abs() < 0.01, "L of white should be ~100, got {}", lab.l);
        assert!(lab.a.abs() < 0.01, "a of white should be ~0, got {}", lab.a);
        assert!(lab.b.abs() < 0.01, "b of white should be ~0, got {}", lab.b);
    }

    #[test]
    fn gray_lightness_is_monotonic() {
        let mut previous = f32::MIN;
        for v in 0..=255u8 {
            let l = rgb_to_lab(v, v, v).l;
            assert!(l >= previous, "gray L decreased at {v}");
            previous = l;
        }
    }

    #[test]
    fn agrees_with_palette_conversion() {
        let colors = [
            PixelColor::new(253, 219, 172),
            PixelColor::new(141, 85, 36),
            PixelColor::new(200, 100, 50),
            PixelColor::new(0, 255, 0),
            PixelColor::new(12, 34, 200),
        ];
        for c in colors {
            let ours = c.to_lab();
            let srgb: Srgb<f32> = Srgb::new(c.r, c.g, c.b).into_format();
            let reference: Lab = srgb.into_color();
            assert!(
                (ours.l - reference.l).abs() < 0.1
                    && (ours.a - reference.a).abs() < 0.5
                    && (ours.b - reference.b).abs() < 0.5,
                "{c}: ours {ours:?} vs palette {reference:?}"
            );
        }
    }

    #[test]
    fn fractional_channels_match_integer_path() {
        let a = channels_to_lab([120.0, 80.0, 60.0]);
        let b = rgb_to_lab(120, 80, 60);
        assert_eq!((a.l, a.a, a.b), (b.l, b.a, b.b));
    }

    #[test]
    fn brightness_is_channel_mean() {
        assert_eq!(PixelColor::new(30, 60, 90).brightness(), 60.0);
        assert_eq!(WHITE.brightness(), 255.0);
    }

    #[test]
    fn clamped_rounding() {
        let c = PixelColor::from_channels_clamped([-4.0, 127.5, 300.0]);
        assert_eq!(c, PixelColor::new(0, 128, 255));
    }

    #[test]
    fn display_matches_to_hex() {
        let color = PixelColor::new(171, 205, 239);
        assert_eq!(format!("{color}"), color.to_hex());
        assert_eq!(color.to_hex(), "#abcdef");
    }
}
