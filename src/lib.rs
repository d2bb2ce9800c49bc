mod commands;
mod pipeline;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub use pipeline::Pipeline;

const DEFAULT_FILTER: &str = "wireshot=info,wire_scene=info,wire_vision=info,wire_export=info";
const VERBOSE_FILTER: &str = "wireshot=debug,wire_scene=debug,wire_vision=debug,wire_export=debug";

#[derive(Parser, Debug)]
#[command(
    name = "wireshot",
    version,
    about = "Rebuild editable wireframes from UI screenshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON pipeline config. Defaults to <data-dir>/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding config.json, icons.json and icons/.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a screenshot and its detections into wireframe documents
    Convert(commands::ConvertArgs),
    /// Print the active label vocabulary as JSON
    Labels,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(commands::resolve_data_dir);
    let config = commands::load_config(cli.config.as_deref(), &data_dir)?;

    match cli.command {
        Commands::Convert(args) => commands::convert(args, config, &data_dir),
        Commands::Labels => commands::labels(&config),
    }
}
