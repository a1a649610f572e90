//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let output_format = cli.output.unwrap_or(OutputFormat::Pretty);

    // Wallet from CLI, env, or config
    let wallet_path = cli
        .wallet
        .unwrap_or_else(|| config.wallet.path.clone());

    // Create context for commands
    let ctx = commands::Context {
        config,
        wallet_path,
        output_format,
    };

    // Dispatch to appropriate command; no subcommand means enroll
    match cli.command {
        None => commands::enroll::execute(ctx, cli.enroll).await,
        Some(Commands::Enroll(args)) => commands::enroll::execute(ctx, args).await,
        Some(Commands::Info(args)) => commands::info::execute(ctx, args).await,
        Some(Commands::List) => commands::list::execute(ctx).await,
        Some(Commands::Show(args)) => commands::show::execute(ctx, args).await,
    }
}

/// Log to stderr so stdout stays parseable; `RUST_LOG` overrides the level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Fails only if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
