//! In-memory image loader.

use qball_env::{ImageError, ImageLoader, ScreenImage};
use std::collections::HashSet;
use std::path::Path;

/// Serves a solid test card for every file name except the ones listed.
#[derive(Debug, Clone, Default)]
pub struct SimImageLoader {
    missing: HashSet<String>,
    corrupt: HashSet<String>,
}

impl SimImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(mut self, name: impl Into<String>) -> Self {
        self.missing.insert(name.into());
        self
    }

    pub fn with_corrupt(mut self, name: impl Into<String>) -> Self {
        self.corrupt.insert(name.into());
        self
    }
}

impl ImageLoader for SimImageLoader {
    fn load(&self, path: &Path) -> Result<ScreenImage, ImageError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.missing.contains(&name) {
            return Err(ImageError::Missing(path.display().to_string()));
        }
        if self.corrupt.contains(&name) {
            return Err(ImageError::Decode(format!("{}: truncated PNG stream", path.display())));
        }
        Ok(ScreenImage::solid(40, 80, 200))
    }
}
