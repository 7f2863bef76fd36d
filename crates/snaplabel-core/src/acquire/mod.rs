//! Image acquisition: letting the user choose one picture.
//!
//! A picker is the seam between the pipeline and whatever front end shows the
//! chooser. It answers a single request with either a cancellation or one
//! picked file; it never retries on its own.
//!
//! - **path**: a fixed file chosen up front (command-line one-shot)
//! - **library**: a chooser over the supported images in a library directory

mod library;
mod path;

pub use library::{LibraryChooser, LibraryEntry, LibraryPicker};
pub use path::PathPicker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PickError;

/// Location of a user-chosen picture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// `file://` URI for display.
    pub fn uri(&self) -> String {
        format!("file://{}", self.0.display())
    }

    /// File name portion, or the whole path when there is none.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// Rectangle the user cropped the picture to, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Parse `x,y,width,height`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [x, y, width, height] if *width > 0 && *height > 0 => Some(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }

    /// Clamp the rectangle to an image of `width × height`.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: w,
            height: h,
        })
    }
}

/// What the picker is allowed to offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickOptions {
    /// Let the user crop the picture before it is returned
    pub allows_editing: bool,
}

/// One picked file plus the user's edit, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    pub image: ImageRef,
    pub crop: Option<CropRect>,
}

impl PickedImage {
    pub fn new(image: ImageRef) -> Self {
        Self { image, crop: None }
    }

    pub fn with_crop(mut self, crop: Option<CropRect>) -> Self {
        self.crop = crop;
        self
    }
}

/// Result of a single pick request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The user closed the chooser without picking
    Canceled,
    /// The user picked exactly one image
    Picked(PickedImage),
}

/// A chooser that returns one image or a cancellation.
///
/// Uses `async_trait` so the controller can hold a `Box<dyn ImagePicker>`.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// Picker name for logging.
    fn name(&self) -> &str;

    /// Open the chooser once and wait for the user's answer.
    async fn pick(&self, options: &PickOptions) -> Result<PickOutcome, PickError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_parse() {
        let crop = CropRect::parse("10, 20,100,50").unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            }
        );
        assert!(CropRect::parse("1,2,3").is_none());
        assert!(CropRect::parse("1,2,0,4").is_none());
        assert!(CropRect::parse("a,b,c,d").is_none());
    }

    #[test]
    fn test_crop_clamp() {
        let crop = CropRect {
            x: 50,
            y: 50,
            width: 100,
            height: 100,
        };
        let clamped = crop.clamp_to(120, 80).unwrap();
        assert_eq!((clamped.width, clamped.height), (70, 30));
        assert!(crop.clamp_to(50, 200).is_none());
    }

    #[test]
    fn test_image_ref_uri_and_name() {
        let image = ImageRef::new("/photos/cat.jpg");
        assert_eq!(image.uri(), "file:///photos/cat.jpg");
        assert_eq!(image.file_name(), "cat.jpg");
    }
}
