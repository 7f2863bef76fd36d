//! Library picker: a chooser restricted to the images in one directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{CropRect, ImagePicker, ImageRef, PickOptions, PickOutcome, PickedImage};
use crate::config::PickerConfig;
use crate::error::PickError;

/// One image offered by the library.
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// The front end half of the library picker.
///
/// Shows the entries and returns the chosen index (plus the crop the user drew
/// when editing is allowed), or `None` when the user backs out.
#[async_trait]
pub trait LibraryChooser: Send + Sync {
    async fn choose(
        &self,
        entries: &[LibraryEntry],
        allows_editing: bool,
    ) -> Result<Option<(usize, Option<CropRect>)>, PickError>;
}

/// Lists supported images under a directory and delegates the choice.
pub struct LibraryPicker {
    root: PathBuf,
    config: PickerConfig,
    chooser: Box<dyn LibraryChooser>,
}

impl LibraryPicker {
    pub fn new(root: impl Into<PathBuf>, config: PickerConfig, chooser: Box<dyn LibraryChooser>) -> Self {
        Self {
            root: root.into(),
            config,
            chooser,
        }
    }

    /// Find every supported image under the library root, sorted by path.
    ///
    /// An unreadable root is a permission problem, not an empty library.
    pub fn scan(&self) -> Result<Vec<LibraryEntry>, PickError> {
        std::fs::read_dir(&self.root).map_err(|e| PickError::from_io(e, &self.root))?;

        let mut entries: Vec<LibraryEntry> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
            .filter_map(|e| {
                let size = e.metadata().ok()?.len();
                Some(LibraryEntry {
                    path: e.into_path(),
                    size,
                })
            })
            .collect();

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl ImagePicker for LibraryPicker {
    fn name(&self) -> &str {
        "library"
    }

    async fn pick(&self, options: &PickOptions) -> Result<PickOutcome, PickError> {
        let entries = self.scan()?;
        if entries.is_empty() {
            return Err(PickError::Unavailable(format!(
                "no supported images in {}",
                self.root.display()
            )));
        }
        tracing::debug!("Library {:?} offers {} image(s)", self.root, entries.len());

        let Some((index, crop)) = self.chooser.choose(&entries, options.allows_editing).await?
        else {
            return Ok(PickOutcome::Canceled);
        };

        let entry = entries.get(index).ok_or_else(|| {
            PickError::Unavailable(format!("chooser returned out-of-range index {index}"))
        })?;
        let crop = if options.allows_editing { crop } else { None };

        Ok(PickOutcome::Picked(
            PickedImage::new(ImageRef::new(&entry.path)).with_crop(crop),
        ))
    }
}
