//! cli
//!
//! Command-line interface layer for multistack.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that build the app from configuration and hand it to
//! [`crate::synth`].

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = commands::Context {
        cwd: cli.cwd.clone(),
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };
    init_tracing(ctx.verbosity());

    commands::dispatch(cli.command, &ctx)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` sets the filter unless `--debug` is given. Logs go to
/// stderr so stdout stays parseable.
fn init_tracing(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Debug => EnvFilter::new(verbosity.log_filter()),
        _ => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
    };

    // try_init: a subscriber may already be installed when run in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity == Verbosity::Debug)
        .try_init();
}
