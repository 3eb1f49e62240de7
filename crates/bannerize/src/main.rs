//! bannerize CLI - scale, blur, and band-crop banner images.
//!
//! Each source image is pushed through an ordered stage pipeline on a
//! shared work queue, consumed by a fixed-size worker pool.
//!
//! # Usage
//!
//! ```bash
//! # Crop horizontal bands from every image in ./images
//! bannerize run ./images
//!
//! # Both axes, explicit output directory and a manifest
//! bannerize run ./images -o ./banners --axis both --manifest crops.jsonl
//!
//! # View configuration
//! bannerize config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// bannerize - queue-driven banner crop pipeline.
#[derive(Parser, Debug)]
#[command(name = "bannerize")]
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
    /// Process a directory of images into banner crops
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match bannerize_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `bannerize config path`."
            );
            bannerize_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("bannerize v{}", bannerize_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
