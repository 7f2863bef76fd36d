//! Model check before the interactive screen opens.

use crate::cli::models::{check_installed, download, InstalledModel};
use console::Style;
use dialoguer::Confirm;
use snaplabel_core::Config;

use super::{handle_interrupt, theme::snaplabel_theme};

/// Make sure the configured model is on disk, offering to download it.
///
/// Returns `false` when the user declines and no model is available.
pub async fn ensure_model(config: &Config) -> anyhow::Result<bool> {
    let status = check_installed(config);
    print_status(&status, config);

    if status.can_classify() && status.labels {
        return Ok(true);
    }

    let prompt = if status.can_classify() {
        "Label file is missing. Download it?"
    } else {
        "Model is not installed. Download it now?"
    };
    let confirmed = handle_interrupt(
        Confirm::with_theme(&snaplabel_theme())
            .with_prompt(prompt)
            .default(true)
            .interact(),
    )?
    .unwrap_or(false);

    if confirmed {
        download(config, &reqwest::Client::new()).await?;
        let done = Style::new().for_stderr().green();
        eprintln!("{}", done.apply_to("  Download complete."));
        eprintln!();
        return Ok(true);
    }

    Ok(status.can_classify())
}

fn print_status(status: &InstalledModel, config: &Config) {
    let ok = Style::new().for_stderr().green();
    let missing = Style::new().for_stderr().red();
    let dim = Style::new().for_stderr().dim();

    let check = |installed: bool, label: &str| {
        let mark = if installed {
            ok.apply_to("✓")
        } else {
            missing.apply_to("✗")
        };
        let note = if installed { "" } else { "not installed" };
        eprintln!("  {} {:<26} {}", mark, label, dim.apply_to(note));
    };

    eprintln!(
        "  {}",
        dim.apply_to(format!("Model: {}", config.model_variant_dir().display()))
    );
    check(status.model, "Classifier (model.onnx)");
    check(status.labels, "Labels (labels.txt)");
    eprintln!();
}
