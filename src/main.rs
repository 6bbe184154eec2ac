//! Pathgen CLI entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use pathgen_core::RunConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "pathgen")]
#[command(about = "Enumerate bounded execution paths of a TLC state graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./pathgen.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the node, edge and message corpus for a state graph
    Generate {
        /// TLC dot dump to read
        input: PathBuf,

        /// Output prefix for <prefix>.node, <prefix>.edge and <prefix>.message
        prefix: PathBuf,

        /// Maximum number of transitions per path
        step_limit: usize,

        /// Diff extractor to run on every transition
        #[arg(short, long)]
        protocol: Option<String>,

        /// Do not draw progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Print paths from a generated corpus with their state labels
    Show {
        /// Prefix the corpus was generated with
        prefix: PathBuf,

        /// 1-based lines of <prefix>.edge
        #[arg(required = true)]
        lines: Vec<usize>,
    },
    /// Load a state graph and print its shape
    Stats {
        /// TLC dot dump to read
        input: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RunConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Initialize logging
    let filter = match (&config.log_filter, cli.verbose) {
        (Some(filter), false) => filter.clone(),
        (_, verbose) => {
            let log_level = if verbose { "debug" } else { "info" };
            format!("pathgen={log_level},pathgen_core={log_level},pathgen_extractors={log_level}")
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Pathgen v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Generate {
            input,
            prefix,
            step_limit,
            protocol,
            no_progress,
        } => {
            let protocol = protocol.unwrap_or_else(|| config.protocol.clone());
            let ui = ui::Ui::new(config.progress && !no_progress);
            commands::generate(&input, &prefix, step_limit, &protocol, &ui)
        }
        Commands::Show { prefix, lines } => commands::show(&prefix, &lines),
        Commands::Stats { input } => commands::stats(&input),
        Commands::Version => {
            println!("Pathgen v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
