//! Archivist CLI - batch-archive generated images.
//!
//! Archivist scans a directory for source images, saves the generation
//! metadata embedded in each one as a sidecar file, writes an AVIF copy, and
//! moves the original into a review directory with the same layout.
//!
//! # Usage
//!
//! ```bash
//! # Archive everything under ./renders (originals go to ./renders_review)
//! archivist run ./renders
//!
//! # Choose the review directory and worker count
//! archivist run ./renders --review /mnt/review -p 8
//!
//! # Verify that exiftool and magick are installed
//! archivist check
//!
//! # View configuration
//! archivist config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Archivist - save image metadata, convert to AVIF, and move originals aside for review.
#[derive(Parser, Debug)]
#[command(name = "archivist")]
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
    /// Archive every image under a directory
    Run(cli::run::RunArgs),

    /// Check that the external tools are installed
    Check,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loaded once; a broken config file aborts every command that needs it.
    let loaded = archivist_core::Config::load();
    let log_config = loaded.as_ref().cloned().unwrap_or_default();
    logging::init_from_config(&log_config, cli.verbose, cli.json_logs);

    tracing::debug!("Archivist v{}", archivist_core::VERSION);

    let config = loaded.map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Fix or regenerate the file shown by `archivist config path`."
        )
    });

    // `config path` and `config init` must work even when the file is broken.
    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config?).await,
        Commands::Check => cli::check::execute(&config?),
        Commands::Config(args) => cli::config::execute(args, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["archivist", "run", "./renders", "-v", "--json-logs"])
            .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_run_requires_scan_root() {
        assert!(Cli::try_parse_from(["archivist", "run"]).is_err());
    }
}
