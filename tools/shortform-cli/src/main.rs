//! Shortform CLI: compose vertical shorts from narration and captions.
//!
//! Usage:
//!   shortform run [OPTIONS]          Compose every narration/caption pair
//!   shortform captions <SRT>         Retime a caption file word by word
//!   shortform graph                  Print the filter graph for the config
//!   shortform check                  Check renderer, fonts and inputs
//!   shortform init-config <PATH>     Write the default configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use shortform_common::config::{AppConfig, CaptionGranularity};

mod commands;

#[derive(Parser)]
#[command(
    name = "shortform",
    about = "Word-by-word captioned vertical shorts from narration tracks",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose every narration/caption pair in the stories directory
    Run {
        /// Configuration file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding <id>_tts.mp3 and <id>_subs.srt pairs
        #[arg(long)]
        stories_dir: Option<PathBuf>,

        /// Directory holding background clips
        #[arg(long)]
        backgrounds_dir: Option<PathBuf>,

        /// Directory finished videos are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Seed for background selection
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the enhancement pass
        #[arg(long)]
        no_enhance: bool,

        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retime a caption file to one cue per word
    Captions {
        /// Caption file to process
        input: PathBuf,

        /// Write here instead of rewriting the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Display buffer in seconds
        #[arg(long)]
        buffer: Option<f64>,

        /// Caption granularity
        #[arg(long, value_enum)]
        granularity: Option<GranularityArg>,

        /// Configuration file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the composition filter graph for the current configuration
    Graph {
        /// Configuration file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Caption file to reference in the burn-in stage
        #[arg(long)]
        captions: Option<PathBuf>,
    },

    /// Check renderer availability, fonts and input directories
    Check {
        /// Configuration file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GranularityArg {
    Word,
    Cue,
}

impl From<GranularityArg> for CaptionGranularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Word => CaptionGranularity::Word,
            GranularityArg::Cue => CaptionGranularity::Cue,
        }
    }
}

impl Commands {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Commands::Run { config, .. }
            | Commands::Captions { config, .. }
            | Commands::Graph { config, .. }
            | Commands::Check { config } => config.as_ref(),
            Commands::InitConfig { .. } => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match (&cli.command, cli.command.config_path()) {
        (Commands::InitConfig { .. }, _) => AppConfig::default(),
        (_, Some(path)) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        (_, None) => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    shortform_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Run {
            config: _,
            stories_dir,
            backgrounds_dir,
            output_dir,
            seed,
            no_enhance,
            json,
        } => commands::run::run(
            config,
            commands::run::RunOverrides {
                stories_dir,
                backgrounds_dir,
                output_dir,
                seed,
                no_enhance,
            },
            json,
        ),
        Commands::Captions {
            input,
            output,
            buffer,
            granularity,
            config: _,
        } => commands::captions::run(&config, input, output, buffer, granularity.map(Into::into)),
        Commands::Graph {
            config: _,
            captions,
        } => commands::graph::run(&config, captions),
        Commands::Check { config: _ } => commands::check::run(&config),
        Commands::InitConfig { path, force } => commands::init_config::run(path, force),
    }
}
