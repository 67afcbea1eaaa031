mod cli;
mod shutdown;
mod startup;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting snapcal");

    // Load configuration
    let mut config = startup::load_config()?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    match cli.command {
        Commands::Scan { source } => {
            if let Some(source) = source {
                config.source_path = source;
            }
            startup::run_scan(config).await
        }
        Commands::Image { path } => startup::run_image(config, path).await,
        Commands::Parse { text, at } => startup::run_parse(config, &text, at.as_deref()),
    }
}
