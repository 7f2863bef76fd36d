//! The `snaplabel interactive` command: the one-screen app.
//!
//! Shows the selected picture (or a placeholder), its top labels, and either
//! the select button or a spinner. Selecting opens a chooser over the image
//! library; the controller does the rest.

pub mod chooser;
pub mod models;
pub mod theme;

use clap::Args;
use console::Style;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use snaplabel_core::acquire::LibraryPicker;
use snaplabel_core::render::{self, RenderOptions};
use snaplabel_core::{Config, Controller, CycleOutcome, Phase};
use std::path::PathBuf;
use std::time::Duration;

use chooser::TerminalChooser;

/// Arguments for the `interactive` command.
#[derive(Args, Debug)]
pub struct InteractiveArgs {
    /// Image library to choose from (defaults to `[general] library_dir`)
    #[arg(short, long)]
    pub library: Option<PathBuf>,
}

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const MENU_QUIT: &str = "Quit";

/// Execute the interactive command.
pub async fn execute(args: InteractiveArgs, config: Config) -> anyhow::Result<()> {
    theme::print_banner();

    if !models::ensure_model(&config).await? {
        anyhow::bail!("No model installed. Run `snaplabel models download` first.");
    }

    let library = match args.library {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => config.library_dir(),
    };
    tracing::debug!("Image library: {:?}", library);

    let picker = LibraryPicker::new(
        &library,
        config.picker.clone(),
        Box::new(TerminalChooser::new(&library)),
    );
    let controller = Controller::from_config(&config, Box::new(picker));
    let render_options = RenderOptions {
        color: console::colors_enabled_stderr(),
        ..RenderOptions::default()
    };
    let theme = theme::snaplabel_theme();
    let dim = Style::new().for_stderr().dim();

    loop {
        eprintln!();
        eprintln!("{}", render::render(&controller.state(), &render_options));
        eprintln!();

        let items = [render_options.button_label.as_str(), MENU_QUIT];
        let selection = handle_interrupt(
            Select::with_theme(&theme)
                .items(&items)
                .default(0)
                .interact_opt(),
        )?
        .flatten();

        match selection {
            Some(0) => match run_with_spinner(&controller).await {
                CycleOutcome::Canceled => eprintln!("  {}", dim.apply_to("Nothing selected.")),
                CycleOutcome::Failed => {
                    eprintln!("  {}", dim.apply_to("Couldn't classify that image."))
                }
                CycleOutcome::Classified { .. } | CycleOutcome::Busy => {}
            },
            _ => break, // Quit, Esc or Ctrl+C
        }
    }

    Ok(())
}

/// Run one cycle, animating a spinner while the model works.
///
/// The spinner only runs during `Classifying`; while the chooser is open the
/// terminal belongs to dialoguer.
async fn run_with_spinner(controller: &Controller) -> CycleOutcome {
    let mut state = controller.subscribe();
    let cycle = controller.select_image();
    tokio::pin!(cycle);

    let mut spinner: Option<ProgressBar> = None;

    let outcome = loop {
        tokio::select! {
            outcome = &mut cycle => break outcome,
            changed = state.changed() => {
                if changed.is_err() {
                    break (&mut cycle).await;
                }
                let phase = state.borrow_and_update().phase;
                if phase == Phase::Classifying && spinner.is_none() {
                    spinner = Some(start_spinner());
                }
            }
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    outcome
}

fn start_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("  {spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Classifying…");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
