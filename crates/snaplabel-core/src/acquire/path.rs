//! Picker for an image chosen before the cycle starts.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{CropRect, ImagePicker, ImageRef, PickOptions, PickOutcome, PickedImage};
use crate::error::PickError;

/// Returns the same file on every pick.
///
/// The file must exist and be readable; an unreadable file is reported as
/// `PermissionDenied`, just like a refused library permission.
pub struct PathPicker {
    path: PathBuf,
    crop: Option<CropRect>,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            crop: None,
        }
    }

    /// Attach a crop, applied only when the pick options allow editing.
    pub fn with_crop(mut self, crop: Option<CropRect>) -> Self {
        self.crop = crop;
        self
    }
}

#[async_trait]
impl ImagePicker for PathPicker {
    fn name(&self) -> &str {
        "path"
    }

    async fn pick(&self, options: &PickOptions) -> Result<PickOutcome, PickError> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| PickError::from_io(e, &self.path))?;
        if !meta.is_file() {
            return Err(PickError::NotFound(self.path.clone()));
        }
        // Opening is the only portable way to learn whether we may read it.
        tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| PickError::from_io(e, &self.path))?;

        let crop = if options.allows_editing {
            self.crop
        } else {
            None
        };
        tracing::debug!("Picked {:?} (crop: {:?})", self.path, crop);

        Ok(PickOutcome::Picked(
            PickedImage::new(ImageRef::new(&self.path)).with_crop(crop),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pick_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let picker = PathPicker::new(&path);
        let outcome = picker.pick(&PickOptions::default()).await.unwrap();
        assert_eq!(
            outcome,
            PickOutcome::Picked(PickedImage::new(ImageRef::new(&path)))
        );
    }

    #[tokio::test]
    async fn test_pick_missing_file() {
        let picker = PathPicker::new("/nonexistent/cat.jpg");
        let err = picker.pick(&PickOptions::default()).await.unwrap_err();
        assert!(matches!(err, PickError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_crop_dropped_without_editing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"x").unwrap();
        let crop = CropRect::parse("0,0,10,10");

        let picker = PathPicker::new(&path).with_crop(crop);

        let PickOutcome::Picked(picked) = picker.pick(&PickOptions::default()).await.unwrap()
        else {
            panic!("expected a pick");
        };
        assert!(picked.crop.is_none());

        let editing = PickOptions {
            allows_editing: true,
        };
        let PickOutcome::Picked(picked) = picker.pick(&editing).await.unwrap() else {
            panic!("expected a pick");
        };
        assert_eq!(picked.crop, crop);
    }
}
