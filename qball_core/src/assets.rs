//! Face-display assets: logical keys resolved under an install directory,
//! decoded with the `image` crate.

use image::imageops::FilterType;
use qball_env::{ImageError, ImageLoader, ScreenImage, SCREEN_HEIGHT, SCREEN_WIDTH};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Resolves image keys (e.g. `ket-101.png`) relative to the asset directory.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Startup check: the asset directory itself must exist.
    pub fn ensure_exists(&self) -> Result<(), ConfigError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::AssetDirMissing(self.root.clone()))
        }
    }
}

/// Loads image files from disk and scales them to the face display.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<ScreenImage, ImageError> {
        let decoded = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ImageError::Missing(path.display().to_string())
            }
            other => ImageError::Decode(format!("{}: {}", path.display(), other)),
        })?;

        let rgb = decoded
            .resize_exact(SCREEN_WIDTH, SCREEN_HEIGHT, FilterType::Triangle)
            .to_rgb8();
        Ok(ScreenImage::from_rgb8(SCREEN_WIDTH, SCREEN_HEIGHT, rgb.as_raw()))
    }
}
