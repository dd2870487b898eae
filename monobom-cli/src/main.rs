//! monobom CLI entry point
//!
//! Parses arguments, initialises tracing, wires Ctrl-C into the pipeline's
//! cancellation token and maps command results to process exit codes.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use monobom_core::config::MonobomConfig;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli).await;

    // Ctrl-C cancels the shared token; in-flight external tools are killed
    // by the ProcessRunner before the pipeline unwinds.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, cancel, &writer).await,
        Commands::Discover(args) => commands::discover::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        use colored::Colorize;
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

/// Initialise the tracing subscriber.
///
/// Level priority: `--log-level` flag, then `RUST_LOG`, then the config
/// file's `[general] log_level`. Logs go to stderr so that report output
/// on stdout stays machine-readable. A broken config file falls back to
/// defaults here; the actual command surfaces the load error properly.
async fn init_tracing(cli: &Cli) {
    let config = MonobomConfig::load(&cli.config).await.unwrap_or_default();

    let filter = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or(config.general.log_level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
