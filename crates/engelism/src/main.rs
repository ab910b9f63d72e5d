//! Engelism CLI - camera override protocols for architectural reference photos.
//!
//! Engelism asks a vision-capable language model (Gemini, OpenAI, or
//! Anthropic) how to re-shoot a building from a new camera angle, shot scale,
//! and lens, and returns the answer as a structured JSON protocol.
//!
//! # Usage
//!
//! ```bash
//! # One protocol for one combination
//! engelism generate --image facade.jpg --angle worms_eye --scale full_shot --lens 24mm_wide
//!
//! # Every angle × scale combination from the saved batch config
//! engelism fabricate --concurrency 5
//!
//! # View configuration
//! engelism config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Engelism - camera override protocol generator.
#[derive(Parser, Debug)]
#[command(name = "engelism")]
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
    /// Generate one protocol for a reference image
    Generate(cli::generate::GenerateArgs),

    /// Generate protocols for every angle and scale in the catalog
    Fabricate(cli::fabricate::FabricateArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match engelism_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `engelism config path`."
            );
            engelism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Engelism v{}", engelism_core::VERSION);

    match cli.command {
        Commands::Generate(args) => cli::generate::execute(args, config).await,
        Commands::Fabricate(args) => cli::fabricate::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
