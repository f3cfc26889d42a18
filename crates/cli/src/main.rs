//! Bioink Printability Predictor CLI
//!
//! Trains the printability model from a CSV export and scores
//! formulations against the saved artifact.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, predict, train};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bioink Printability Predictor CLI
#[derive(Parser)]
#[command(name = "bioprint")]
#[command(author, version, about = "CLI for the Bioink Printability Predictor", long_about = None)]
pub struct Cli {
    /// Model directory (can also be set via BIOPRINT_MODEL_DIR env var)
    #[arg(long, global = true, env = "BIOPRINT_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the model from a CSV export of the experimental dataset
    Train {
        /// Path to the dataset CSV
        #[arg(long, short)]
        data: PathBuf,
    },

    /// Predict printability for one formulation
    Predict(predict::PredictArgs),

    /// Show allowed parameter ranges and defaults
    Ranges,

    /// Show the feature importance ranking of the saved model
    Importance,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train { data } => {
            train::train(&data, &cli.model_dir, cli.format)?;
        }
        Commands::Predict(args) => {
            predict::predict(&args, &cli.model_dir, cli.format)?;
        }
        Commands::Ranges => {
            inspect::show_ranges(cli.format)?;
        }
        Commands::Importance => {
            inspect::show_importance(&cli.model_dir, cli.format)?;
        }
    }

    Ok(())
}
