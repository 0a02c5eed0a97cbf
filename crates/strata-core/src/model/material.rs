//! Source materials and textures.

use crate::color::Rgba8;
use serde::{Deserialize, Serialize};

/// A material as stored by the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub color: Rgba8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<Texture>,
}

impl Material {
    pub fn new(name: impl Into<String>, color: Rgba8) -> Self {
        Self {
            name: name.into(),
            color,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// UV tiling factors applied to faces that inherit this material.
    pub fn uv_scale(&self) -> (f64, f64) {
        self.texture
            .as_ref()
            .map(|texture| (texture.s_scale, texture.t_scale))
            .unwrap_or((1.0, 1.0))
    }
}

/// A texture image attached to a material.
///
/// Image bytes come either from base64 `data` embedded in the document or
/// from a file at `path`; readers resolve them into `bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    /// Source file name, possibly with a Windows-style directory prefix.
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "unit_scale")]
    pub s_scale: f64,
    #[serde(default = "unit_scale")]
    pub t_scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
}

fn unit_scale() -> f64 {
    1.0
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 0,
            height: 0,
            s_scale: 1.0,
            t_scale: 1.0,
            data: None,
            path: None,
            bytes: None,
        }
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub fn with_scale(mut self, s_scale: f64, t_scale: f64) -> Self {
        self.s_scale = s_scale;
        self.t_scale = t_scale;
        self
    }

    /// File name without any directory prefix.
    pub fn image_name(&self) -> &str {
        self.name
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_name_strips_directories() {
        assert_eq!(Texture::new(r"C:\textures\brick.jpg").image_name(), "brick.jpg");
        assert_eq!(Texture::new("maps/wood.png").image_name(), "wood.png");
        assert_eq!(Texture::new("plain.png").image_name(), "plain.png");
    }

    #[test]
    fn test_uv_scale_defaults_to_one() {
        let plain = Material::new("Red", Rgba8::new(255, 0, 0, 255));
        assert_eq!(plain.uv_scale(), (1.0, 1.0));
        let tiled = plain.with_texture(Texture::new("t.png").with_scale(0.5, 2.0));
        assert_eq!(tiled.uv_scale(), (0.5, 2.0));
    }
}
