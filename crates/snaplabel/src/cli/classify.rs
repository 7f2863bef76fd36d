//! The `snaplabel classify` command: one cycle over a file given on the
//! command line.

use clap::Args;
use snaplabel_core::acquire::CropRect;
use snaplabel_core::{
    ClassificationRecord, Config, Controller, CycleOutcome, OutputFormat, OutputWriter,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file to classify
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Crop to `x,y,width,height` (source pixels) before classifying
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRect>,

    /// Number of labels to report
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output format: json or jsonl (defaults to `[output] format`)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write the record to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_crop(s: &str) -> Result<CropRect, String> {
    CropRect::parse(s).ok_or_else(|| format!("expected x,y,width,height with nonzero size, got '{s}'"))
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(k) = args.top_k {
        if k == 0 {
            anyhow::bail!("--top-k must be at least 1");
        }
        config.model.top_k = k;
    }

    let format_name = args.format.as_deref().unwrap_or(&config.output.format);
    let Some(format) = OutputFormat::parse(format_name) else {
        anyhow::bail!("Unknown output format '{format_name}' (expected json or jsonl)");
    };

    if args.crop.is_some() && !config.picker.allows_editing {
        tracing::warn!("Ignoring --crop: editing is disabled in [picker] allows_editing");
    }

    let (outcome, state) =
        Controller::classify_path(&config, args.image.clone(), args.crop).await;

    match outcome {
        CycleOutcome::Classified { count } => {
            tracing::debug!("{count} labels for {}", args.image.display());
        }
        CycleOutcome::Canceled => {
            anyhow::bail!("Cannot read {}: permission denied", args.image.display())
        }
        CycleOutcome::Failed | CycleOutcome::Busy => {
            anyhow::bail!("Classification failed for {}", args.image.display())
        }
    }

    let Some(image) = state.selected_image else {
        anyhow::bail!("No image was selected");
    };
    let record = ClassificationRecord {
        image,
        results: state.results,
    };

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, format, config.output.pretty);
    writer.write(&record)?;
    writer.flush()?;

    if let Some(path) = &args.output {
        tracing::info!("Wrote results to {}", path.display());
    }

    Ok(())
}
