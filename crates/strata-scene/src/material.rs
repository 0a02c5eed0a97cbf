//! Material and image payloads.

use crate::handle::ImageHandle;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use glam::Vec4;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a material's alpha is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Blend,
}

/// A material in linear color space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub name: String,
    /// Base color (linear RGB, straight alpha).
    pub base_color: Vec4,
    pub alpha_mode: AlphaMode,
    /// Bound texture image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<ImageHandle>,
}

impl MaterialDesc {
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        let alpha_mode = if base_color.w < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        };
        Self {
            name: name.into(),
            base_color,
            alpha_mode,
            texture: None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }
}

/// An encoded image. Pixels are kept in the source encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
    pub data: Vec<u8>,
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_mode_from_color() {
        assert_eq!(MaterialDesc::new("a", Vec4::new(1.0, 1.0, 1.0, 0.5)).alpha_mode, AlphaMode::Blend);
        assert_eq!(MaterialDesc::new("b", Vec4::ONE).alpha_mode, AlphaMode::Opaque);
    }

    #[test]
    fn test_image_data_serialized_as_base64() {
        let image = Image {
            name: "brick.png".into(),
            data: vec![0x89, b'P', b'N', b'G'],
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["data"], "iVBORw==");
        let back: Image = serde_json::from_value(json).unwrap();
        assert_eq!(back, image);
    }
}
