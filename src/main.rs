//! Cadence braille panel driver CLI
//!
//! Lists panels, runs a display session and renders simulated layouts.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
use cli::{Cli, Commands};

mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let (config, config_path) = commands::load_config(cli.config.as_deref())?;
    debug!("Config from {}", config_path.display());

    match cli.command {
        Commands::List { json } => commands::list::list(json)?,
        Commands::Run { image, start_image } => {
            commands::run::run(&config, image.as_deref(), start_image).await?
        }
        Commands::Render {
            image,
            panels,
            flipped,
            threshold,
            channel,
            normal,
        } => commands::render::render(
            &config,
            commands::render::RenderOptions {
                image: &image,
                panels: &panels,
                flipped: &flipped,
                threshold,
                channel,
                normal,
            },
        )?,
        Commands::Layouts { panels } => commands::layouts::layouts(&panels)?,
        Commands::Config { write_default } => {
            commands::config::config(&config_path, &config, write_default)?
        }
    }

    Ok(())
}
