//! Color types and sRGB conversion.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Display gamma used when converting source colors to linear space.
pub const SOURCE_GAMMA: f32 = 2.2;

/// An 8-bit sRGB color with straight alpha, as stored by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha in 0..=1, rounded to two decimals.
    pub fn alpha(&self) -> f32 {
        (self.a as f32 / 255.0 * 100.0).round() / 100.0
    }

    /// Convert to linear RGBA. RGB is gamma-expanded, alpha is not.
    pub fn to_linear(&self) -> Vec4 {
        Vec4::new(
            srgb_channel_to_linear(self.r),
            srgb_channel_to_linear(self.g),
            srgb_channel_to_linear(self.b),
            self.alpha(),
        )
    }

    /// Whether the converted color needs alpha blending.
    pub fn is_translucent(&self) -> bool {
        self.alpha() < 1.0
    }
}

fn srgb_channel_to_linear(channel: u8) -> f32 {
    (channel as f32 / 255.0).powf(SOURCE_GAMMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_alpha_rounds_and_blends() {
        let c = Rgba8::new(255, 0, 0, 128);
        assert_eq!(c.alpha(), 0.5);
        assert!(c.is_translucent());
    }

    #[test]
    fn test_opaque_is_not_translucent() {
        assert!(!Rgba8::new(10, 20, 30, 255).is_translucent());
        // 254/255 rounds to 1.0
        assert!(!Rgba8::new(10, 20, 30, 254).is_translucent());
    }

    #[test]
    fn test_gamma_applies_to_rgb_only() {
        let linear = Rgba8::new(128, 255, 0, 128).to_linear();
        let expected = (128.0f32 / 255.0).powf(2.2);
        assert!((linear.x - expected).abs() < 1e-6);
        assert_eq!(linear.y, 1.0);
        assert_eq!(linear.z, 0.0);
        assert_eq!(linear.w, 0.5);
    }

    #[test]
    fn test_missing_alpha_defaults_opaque() {
        let c: Rgba8 = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(c.a, 255);
    }
}
