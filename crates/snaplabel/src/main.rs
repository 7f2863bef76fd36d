//! snaplabel CLI - pick a picture, see what the model thinks it is.
//!
//! # Usage
//!
//! ```bash
//! # Classify one image and print the top labels as JSON
//! snaplabel classify cat.jpg
//!
//! # Crop before classifying, keep five labels
//! snaplabel classify cat.jpg --crop 40,10,300,300 --top-k 5
//!
//! # Browse ~/Pictures and classify interactively
//! snaplabel interactive
//!
//! # Fetch the model
//! snaplabel models download
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// snaplabel - on-device image classification.
#[derive(Parser, Debug)]
#[command(name = "snaplabel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a single image and print the top labels
    Classify(cli::classify::ClassifyArgs),

    /// Pick images from a library and classify them one at a time
    Interactive(cli::interactive::InteractiveArgs),

    /// Manage the classification model (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match snaplabel_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `snaplabel config path`."
            );
            snaplabel_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("snaplabel v{}", snaplabel_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Interactive(args) => cli::interactive::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
