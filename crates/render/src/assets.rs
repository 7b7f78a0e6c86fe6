//! Brand images. Every asset is optional: a missing or undecodable file is
//! logged and skipped, never an error.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::job::AssetPaths;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Watermark,
    Logo,
    SecondaryLogo,
}

impl AssetRole {
    pub const ALL: [AssetRole; 3] =
        [AssetRole::Watermark, AssetRole::Logo, AssetRole::SecondaryLogo];

    /// XObject resource name inside page dictionaries.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Watermark => b"Im1",
            Self::Logo => b"Im2",
            Self::SecondaryLogo => b"Im3",
        }
    }
}

/// A decoded image: 8-bit RGB samples plus an optional 8-bit alpha plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

impl ImageAsset {
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        let has_alpha = decoded.color().has_alpha();
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels = rgba.as_raw();
        let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(if has_alpha { pixels.len() / 4 } else { 0 });
        for pixel in pixels.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
            if has_alpha {
                alpha.push(pixel[3]);
            }
        }

        Ok(Self { width, height, rgb, alpha: has_alpha.then_some(alpha) })
    }

    /// Height of the image when drawn `width` points wide.
    pub fn scaled_height(&self, width: f32) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        width * self.height as f32 / self.width as f32
    }
}

#[derive(Clone, Debug, Default)]
pub struct AssetSet {
    images: HashMap<AssetRole, ImageAsset>,
}

impl AssetSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub async fn load(paths: &AssetPaths) -> Self {
        let mut set = Self::default();
        let slots = [
            (AssetRole::Watermark, paths.watermark.as_deref()),
            (AssetRole::Logo, paths.logo.as_deref()),
            (AssetRole::SecondaryLogo, paths.secondary_logo.as_deref()),
        ];

        for (role, path) in slots {
            if let Some(asset) = load_one(role, path).await {
                set.insert(role, asset);
            }
        }

        set
    }

    pub fn insert(&mut self, role: AssetRole, asset: ImageAsset) {
        self.images.insert(role, asset);
    }

    pub fn get(&self, role: AssetRole) -> Option<&ImageAsset> {
        self.images.get(&role)
    }

    /// Present assets in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetRole, &ImageAsset)> {
        AssetRole::ALL.into_iter().filter_map(|role| self.get(role).map(|asset| (role, asset)))
    }
}

async fn load_one(role: AssetRole, path: Option<&Path>) -> Option<ImageAsset> {
    let path = path?;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(
                event_name = "render.asset.missing",
                role = ?role,
                path = %path.display(),
                error = %error,
                "asset not found, skipping"
            );
            return None;
        }
    };

    match ImageAsset::decode(&bytes) {
        Ok(asset) => Some(asset),
        Err(error) => {
            warn!(
                event_name = "render.asset.undecodable",
                role = ?role,
                path = %path.display(),
                error = %error,
                "asset could not be decoded, skipping"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};
    use tempfile::TempDir;

    use super::{AssetRole, AssetSet, ImageAsset};
    use crate::job::AssetPaths;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).expect("encode png");
        bytes.into_inner()
    }

    #[test]
    fn decode_splits_color_and_alpha() {
        let asset = ImageAsset::decode(&png_bytes(4, 2)).expect("decode");

        assert_eq!((asset.width, asset.height), (4, 2));
        assert_eq!(asset.rgb.len(), 4 * 2 * 3);
        assert_eq!(&asset.rgb[..3], &[10, 20, 30]);
        assert_eq!(asset.alpha.as_deref().map(<[u8]>::len), Some(8));
        assert_eq!(asset.scaled_height(100.0), 50.0);
    }

    #[tokio::test]
    async fn missing_and_corrupt_assets_are_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let logo = dir.path().join("logo.png");
        let broken = dir.path().join("broken.png");
        std::fs::write(&logo, png_bytes(3, 3)).expect("write logo");
        std::fs::write(&broken, b"not an image").expect("write broken");

        let set = AssetSet::load(&AssetPaths {
            watermark: Some(dir.path().join("absent.png")),
            logo: Some(logo),
            secondary_logo: Some(broken),
        })
        .await;

        assert!(set.get(AssetRole::Watermark).is_none());
        assert!(set.get(AssetRole::Logo).is_some());
        assert!(set.get(AssetRole::SecondaryLogo).is_none());
        assert_eq!(set.iter().count(), 1);
    }
}
