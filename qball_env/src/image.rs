//! Image decoding contract.

use std::path::Path;

use crate::error::ImageError;
use crate::types::ScreenImage;

/// Loads an image file and converts it to the face-display format.
///
/// Returns `ImageError::Missing` when nothing exists at `path` and
/// `ImageError::Decode` for anything unreadable.
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ScreenImage, ImageError>;
}
