//! Plain-text view of the application state.
//!
//! Layout, top to bottom: the selected image (or a placeholder), one row per
//! prediction, then either the loading spinner or the select button. The last
//! two are mutually exclusive on `AppState::is_loading`.

use crate::controller::{AppState, Phase};
use crate::types::Classification;

/// Shown when no image has been picked yet.
pub const PLACEHOLDER: &str = "[ no image selected ]";

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const BAR_WIDTH: usize = 20;

/// Knobs for the text view.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Text on the select button
    pub button_label: String,
    /// Spinner animation frame (wraps)
    pub spinner_frame: usize,
    /// Maximum label column width
    pub label_width: usize,
    /// Emit ANSI colors (bold button, green bars)
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            button_label: "Select image".to_string(),
            spinner_frame: 0,
            label_width: 32,
            color: false,
        }
    }
}

/// Render the whole screen.
pub fn render(state: &AppState, options: &RenderOptions) -> String {
    let mut lines = Vec::with_capacity(state.results.len() + 4);

    lines.push(match &state.selected_image {
        Some(image) => format!("Image: {}", image.uri()),
        None => PLACEHOLDER.to_string(),
    });
    lines.push(String::new());

    for result in &state.results {
        lines.push(format_row(result, options.label_width, options.color));
    }
    if !state.results.is_empty() {
        lines.push(String::new());
    }

    lines.push(status_line(state, options));
    lines.join("\n")
}

/// `label ████████░░░░  87.3%`
pub fn result_row(result: &Classification, label_width: usize) -> String {
    format_row(result, label_width, false)
}

fn format_row(result: &Classification, label_width: usize, color: bool) -> String {
    let pct = (result.probability.clamp(0.0, 1.0) * 100.0) as f64;
    let filled = (((pct / 100.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let bar = format!(
        "{}{}",
        paint(&"█".repeat(filled), GREEN, color && filled > 0),
        "░".repeat(BAR_WIDTH - filled)
    );
    format!(
        "{:<width$} {} {:>5.1}%",
        truncate(&result.class_name, label_width),
        bar,
        pct,
        width = label_width
    )
}

fn status_line(state: &AppState, options: &RenderOptions) -> String {
    let frame = SPINNER_FRAMES[options.spinner_frame % SPINNER_FRAMES.len()];
    let frame = paint(frame, MAGENTA, options.color);
    match state.phase {
        Phase::Idle => paint(&format!("[ {} ]", options.button_label), BOLD, options.color),
        Phase::Acquiring => format!("{frame} Waiting for a picture…"),
        Phase::Classifying => format!("{frame} Classifying…"),
    }
}

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const MAGENTA: &str = "\x1b[35m";
const RESET: &str = "\x1b[0m";

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("{code}{text}{RESET}")
    } else {
        text.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::ImageRef;

    #[test]
    fn test_empty_state_shows_placeholder_and_button() {
        let out = render(&AppState::default(), &RenderOptions::default());
        assert!(out.starts_with(PLACEHOLDER));
        assert!(out.ends_with("[ Select image ]"));
    }

    #[test]
    fn test_loading_hides_button() {
        let state = AppState {
            phase: Phase::Classifying,
            ..AppState::default()
        };
        let out = render(&state, &RenderOptions::default());
        assert!(out.contains("Classifying"));
        assert!(!out.contains("Select image"));
    }

    #[test]
    fn test_results_rendered_in_order() {
        let state = AppState {
            selected_image: Some(ImageRef::new("/photos/cat.jpg")),
            phase: Phase::Idle,
            results: vec![
                Classification::new("tabby, tabby cat", 0.873),
                Classification::new("tiger cat", 0.1),
            ],
        };
        let out = render(&state, &RenderOptions::default());
        assert!(out.contains("file:///photos/cat.jpg"));
        let tabby = out.find("tabby").unwrap();
        let tiger = out.find("tiger cat").unwrap();
        assert!(tabby < tiger);
        assert!(out.contains("87.3%"));
    }

    #[test]
    fn test_row_bar_width_constant() {
        let full = result_row(&Classification::new("a", 1.0), 4);
        let empty = result_row(&Classification::new("a", 0.0), 4);
        assert_eq!(full.chars().count(), empty.chars().count());
        assert!(full.contains(&"█".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_plain_output_has_no_escape_codes() {
        let state = AppState {
            results: vec![Classification::new("tabby", 0.5)],
            ..AppState::default()
        };
        assert!(!render(&state, &RenderOptions::default()).contains('\x1b'));
    }

    #[test]
    fn test_color_wraps_button_and_bar() {
        let state = AppState {
            results: vec![Classification::new("tabby", 0.5)],
            ..AppState::default()
        };
        let options = RenderOptions {
            color: true,
            ..RenderOptions::default()
        };
        let out = render(&state, &options);
        assert!(out.contains(&format!("{BOLD}[ Select image ]{RESET}")));
        assert!(out.contains(&format!("{GREEN}{}{RESET}", "█".repeat(BAR_WIDTH / 2))));
    }

    #[test]
    fn test_long_labels_truncated() {
        let row = result_row(&Classification::new("a".repeat(50), 0.5), 10);
        assert!(row.starts_with(&format!("{}…", "a".repeat(9))));
    }
}
