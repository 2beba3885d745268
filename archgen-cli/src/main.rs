//! archgen CLI - architecture documentation for static web projects
//!
//! Generates module dependency graphs, C4 diagrams, a routes map and a
//! code-level class diagram from an Astro-style project tree, and
//! post-processes build output.

use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::ArchgenConfig;
use output::OutputFormat;

/// Architecture documentation generator.
#[derive(Parser)]
#[command(name = "archgen")]
#[command(author, version)]
#[command(about = "Architecture documentation generator for static web projects")]
#[command(propagate_version = true)]
#[command(after_help = "Quick Start:
  archgen docs          Generate every artifact into docs/architecture
  archgen routes        List page routes
  archgen extract a.ts  Show classes, interfaces and imports of a file

Post-build:
  archgen csp           Write dist/_headers with inline script hashes
  archgen lighthouse    Refresh Lighthouse scores in the performance doc")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all architecture documentation artifacts
    Docs {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Output directory (default: docs/architecture under the project root)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// List page routes and their URL paths
    Routes {
        /// Project root
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show the project configuration read from manifests and workflows
    Config {
        /// Project root
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show source files bucketed by category
    Structure {
        /// Project root
        #[arg(default_value = ".")]
        path: String,
    },

    /// Extract classes, interfaces and imports from TypeScript files
    Extract {
        /// Files to parse
        #[arg(required = true)]
        files: Vec<String>,

        /// Keep private members
        #[arg(long)]
        include_private: bool,

        /// Keep unnamed classes
        #[arg(long)]
        include_anonymous: bool,
    },

    /// Generate Content-Security-Policy headers for built HTML
    Csp {
        /// Build output directory (default: [csp] dist, then "dist")
        dist: Option<String>,
    },

    /// Average Lighthouse CI results into the performance document
    Lighthouse {
        /// Project root
        #[arg(default_value = ".")]
        path: String,
    },
}

impl Commands {
    /// Directory `.archgenrc.toml` is read from.
    fn project_root(&self) -> &str {
        match self {
            Commands::Docs { path, .. }
            | Commands::Routes { path }
            | Commands::Config { path }
            | Commands::Structure { path }
            | Commands::Lighthouse { path } => path.as_str(),
            Commands::Extract { .. } | Commands::Csp { .. } => ".",
        }
    }
}

/// Initialize logging based on verbosity
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    // Configuration lives next to the project being documented
    let config = ArchgenConfig::load(Path::new(command.project_root()));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    // Config wins; otherwise color only when stdout is a terminal
    let use_color = config
        .use_color()
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    colored::control::set_override(use_color);

    match command {
        Commands::Docs { path, out } => docs::run(&path, out.as_deref(), &config, format).await,
        Commands::Routes { path } => routes::run(&path, &config, format).await,
        Commands::Config { path } => manifest::run(&path, &config, format).await,
        Commands::Structure { path } => structure::run(&path, &config, format).await,
        Commands::Extract {
            files,
            include_private,
            include_anonymous,
        } => extract::run(&files, include_private, include_anonymous, &config, format).await,
        Commands::Csp { dist } => csp::run(dist.as_deref(), &config, format).await,
        Commands::Lighthouse { path } => lighthouse::run(&path, &config, format).await,
    }
}
