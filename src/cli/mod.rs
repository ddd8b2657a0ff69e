use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, NewArgs};

#[derive(Parser, Debug)]
#[command(
    name = "noteform",
    version,
    about = "Terminal checklist-note form for a REST notes API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTEFORM_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the notes API base URL from the config file
    #[arg(long)]
    pub api_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a blank form to create a note (default)
    New(NewArgs),
    /// Load an existing note and its checklist into the form
    Edit(EditArgs),
    /// Delete a note without opening the form
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTEFORM_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let mut config = loader.load_or_init()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    let config = Arc::new(config);
    let command = cli
        .command
        .unwrap_or_else(|| Commands::New(NewArgs::default()));
    match command {
        Commands::New(args) => commands::new_note(config, args),
        Commands::Edit(args) => commands::edit_note(config, args),
        Commands::Delete(args) => commands::delete_note(config, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
