//! # Command Line Interface
//!
//! Offline schema inference and manual pushes of prepared documents.

pub mod output;
pub mod push;
pub mod schema;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ObservabilityConfig;
use crate::observability::init_logging;

#[derive(Parser)]
#[command(name = "apifox-capture")]
#[command(about = "Infer request schemas and import OpenAPI documents into ApiFox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer a schema from a captured JSON object
    Schema {
        /// JSON file holding the captured fields
        #[arg(long)]
        data: PathBuf,

        /// JSON file mapping field paths to validation rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// JSON file mapping field paths to titles
        #[arg(long)]
        attributes: Option<PathBuf>,
    },

    /// Push a prepared OpenAPI document using the environment configuration
    Push {
        /// OpenAPI document (JSON)
        #[arg(long)]
        document: PathBuf,

        /// Project ID override
        #[arg(long)]
        project_id: Option<String>,

        /// Base URL override for the ApiFox API
        #[arg(long)]
        base_url: Option<String>,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose)?;

    match cli.command {
        Commands::Schema { data, rules, attributes } => {
            schema::handle_schema_command(&data, rules.as_deref(), attributes.as_deref())?
        }
        Commands::Push { document, project_id, base_url } => {
            push::handle_push_command(&document, project_id, base_url).await?
        }
    }

    Ok(())
}

fn initialise_logging(verbose: bool) -> anyhow::Result<()> {
    let mut config = ObservabilityConfig::from_env()?;
    if verbose {
        config.log_level = "debug".to_string();
    }
    init_logging(&config)?;
    Ok(())
}
