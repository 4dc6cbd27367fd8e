use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinwheel::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "pinwheel",
    version,
    about = "Rotation selection for scheduled media posting",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog directory, overriding the configuration
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the next item and record it
    Select {
        /// Calendar date to select for (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Identifier emitted by the previous run, never chosen again immediately
        #[arg(short, long)]
        previous: Option<String>,

        /// Print the full result as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Seed the random source for a reproducible choice
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show persisted rotation state without changing it
    Status {
        /// Calendar date to evaluate seasonal rules for, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of recent emissions to list
        #[arg(short, long, default_value = "10")]
        recent: usize,
    },

    /// Report how the catalog is distributed across episodes
    Analyze,

    /// Print the episode tag for each name
    Tag {
        /// File names to tag
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(catalog) = cli.catalog {
        config.catalog.directory = catalog;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Select {
            date,
            previous,
            json,
            seed,
        } => {
            tracing::debug!(date = ?date, previous = ?previous, seed = ?seed, "Starting select command");
            commands::select(&config, date, previous, json, seed)?;
        }

        Commands::Status { date, recent } => {
            tracing::debug!(date = ?date, recent, "Starting status command");
            commands::status(&config, date, recent)?;
        }

        Commands::Analyze => {
            tracing::debug!(catalog = %config.catalog.directory.display(), "Starting analyze command");
            commands::analyze(&config)?;
        }

        Commands::Tag { names } => {
            commands::tag(&names);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("pinwheel=debug,warn")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("pinwheel={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
