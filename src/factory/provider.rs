//! Bounding-box providers.
//!
//! The item factory never reads pixels itself. It asks a [`BBoxProvider`]
//! for the bounds of an image reference; the provider owns any I/O and any
//! retry policy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::BBoxError;
use crate::model::BBox;

/// Supplies the bounds of an image, given the reference the caller used.
pub trait BBoxProvider {
    /// Returns the axis-aligned bounds of `image_ref`.
    ///
    /// # Errors
    /// Returns a [`BBoxError`] if the image cannot be opened or has no
    /// known bounds.
    fn bbox(&self, image_ref: &str) -> Result<BBox, BBoxError>;
}

impl<F> BBoxProvider for F
where
    F: Fn(&str) -> Result<BBox, BBoxError>,
{
    fn bbox(&self, image_ref: &str) -> Result<BBox, BBoxError> {
        self(image_ref)
    }
}

/// A lookup table of known bounds.
#[derive(Clone, Debug, Default)]
pub struct StaticBBoxProvider {
    bounds: HashMap<String, BBox>,
}

impl StaticBBoxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the bounds of `image_ref`, replacing any previous entry.
    pub fn insert(&mut self, image_ref: impl Into<String>, bbox: BBox) {
        self.bounds.insert(image_ref.into(), bbox);
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, BBox)> for StaticBBoxProvider {
    fn from_iter<I: IntoIterator<Item = (S, BBox)>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl BBoxProvider for StaticBBoxProvider {
    fn bbox(&self, image_ref: &str) -> Result<BBox, BBoxError> {
        self.bounds
            .get(image_ref)
            .copied()
            .ok_or_else(|| BBoxError::NotFound {
                image_ref: image_ref.to_string(),
            })
    }
}

/// Reads image dimensions from file headers and reports pixel-space bounds
/// `(0, 0, width, height)`.
///
/// Relative references are resolved against `root`. No georeferencing is
/// applied; use this for imagery whose catalog coordinates are pixels.
#[derive(Clone, Debug)]
pub struct PixelBoundsProvider {
    root: PathBuf,
}

impl PixelBoundsProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, image_ref: &str) -> PathBuf {
        let path = Path::new(image_ref);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl BBoxProvider for PixelBoundsProvider {
    fn bbox(&self, image_ref: &str) -> Result<BBox, BBoxError> {
        let path = self.path_for(image_ref);
        let size = imagesize::size(&path)
            .map_err(|source| BBoxError::ImageUnreadable { path, source })?;
        Ok(BBox::from_xyxy(
            0.0,
            0.0,
            size.width as f64,
            size.height as f64,
        ))
    }
}
