//! hydrate CLI - resolve configuration templates against cluster state

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "hydrate")]
#[command(version)]
#[command(about = "Resolve configuration templates against live Kubernetes cluster state", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a document's templates and print the result
    Resolve {
        /// Document file to resolve
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Tolerate undefined template variables instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Check whether a document contains template directives
    Check {
        /// Document file to check
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if debug { "hydrate=debug" } else { "hydrate=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Resolve { file, lenient } => commands::resolve(&file, lenient),
        Commands::Check { file } => commands::check(&file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_args() {
        let cli = Cli::parse_from(["hydrate", "resolve", "-f", "doc.yaml", "--lenient"]);
        match cli.command {
            Commands::Resolve { file, lenient } => {
                assert_eq!(file, PathBuf::from("doc.yaml"));
                assert!(lenient);
            }
            _ => panic!("expected resolve command"),
        }
    }
}
