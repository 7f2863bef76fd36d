//! Terminal front end for the library picker.

use async_trait::async_trait;
use dialoguer::{Input, Select};
use snaplabel_core::acquire::{CropRect, LibraryChooser, LibraryEntry};
use snaplabel_core::PickError;
use std::path::PathBuf;

use super::theme::snaplabel_theme;

/// Lists library images in a `Select` and asks for an optional crop.
pub struct TerminalChooser {
    root: PathBuf,
}

impl TerminalChooser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LibraryChooser for TerminalChooser {
    async fn choose(
        &self,
        entries: &[LibraryEntry],
        allows_editing: bool,
    ) -> Result<Option<(usize, Option<CropRect>)>, PickError> {
        let items: Vec<String> = entries
            .iter()
            .map(|entry| entry_label(entry, &self.root))
            .collect();

        // dialoguer blocks on the terminal
        tokio::task::spawn_blocking(move || prompt(&items, allows_editing))
            .await
            .map_err(|e| PickError::Unavailable(format!("chooser task failed: {e}")))?
    }
}

fn prompt(
    items: &[String],
    allows_editing: bool,
) -> Result<Option<(usize, Option<CropRect>)>, PickError> {
    let theme = snaplabel_theme();

    let selection = Select::with_theme(&theme)
        .with_prompt("Choose an image")
        .items(items)
        .default(0)
        .max_length(15)
        .interact_opt()
        .map_err(pick_error)?;
    let Some(index) = selection else {
        return Ok(None);
    };

    if !allows_editing {
        return Ok(Some((index, None)));
    }

    let crop_text: String = match Input::with_theme(&theme)
        .with_prompt("Crop x,y,width,height (blank for full image)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() || CropRect::parse(input).is_some() {
                Ok(())
            } else {
                Err("expected four numbers, e.g. 0,0,224,224")
            }
        })
        .interact_text()
    {
        Ok(text) => text,
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
            return Ok(None)
        }
        Err(e) => return Err(pick_error(e)),
    };

    Ok(Some((index, CropRect::parse(&crop_text))))
}

fn pick_error(err: dialoguer::Error) -> PickError {
    PickError::Unavailable(format!("terminal: {err}"))
}

/// `cats/tabby.jpg  (1.2 MB)`
fn entry_label(entry: &LibraryEntry, root: &std::path::Path) -> String {
    let shown = entry.path.strip_prefix(root).unwrap_or(&entry.path);
    format!("{}  ({})", shown.display(), human_size(entry.size))
}

fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.0} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_relative_to_root() {
        let entry = LibraryEntry {
            path: PathBuf::from("/home/u/Pictures/cats/tabby.jpg"),
            size: 1_300_000,
        };
        assert_eq!(
            entry_label(&entry, std::path::Path::new("/home/u/Pictures")),
            "cats/tabby.jpg  (1.2 MB)"
        );
    }

    #[test]
    fn sizes_pick_a_unit() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(4096), "4 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
