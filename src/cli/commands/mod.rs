//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the project configuration
//! 2. Builds and assembles the app through [`crate::stack`]
//! 3. Formats and displays output
//!
//! Handlers never touch workspaces directly; everything flows through
//! [`App::assemble`].

mod graph;
mod synth;
mod validate;

pub use graph::graph;
pub use synth::synth;
pub use validate::validate;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::{info, warn};

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::stack::{App, Assembly};
use crate::ui::output::Verbosity;

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Explicit project file.
    pub config: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Output verbosity for this run.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Directory the command runs in.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Resolve a path given on the command line against the project dir.
    pub fn resolve(&self, path: &std::path::Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.project_dir()?.join(path))
        }
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Synth { out } => synth::synth(ctx, &out),
        Command::Graph { json } => graph::graph(ctx, json),
        Command::Validate => validate::validate(ctx),
    }
}

/// Load the project configuration, reporting compatibility warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let dir = ctx.project_dir()?;
    let explicit = match &ctx.config {
        Some(path) => Some(ctx.resolve(path)?),
        None => None,
    };

    let result = Config::load(explicit.as_deref(), &dir).context("Failed to load configuration")?;
    for warning in &result.warnings {
        warn!(path = %warning.path.display(), "{}", warning.message);
    }

    if let Some(path) = result.config.project_config_loaded_from() {
        info!(project = %path.display(), "using project file");
    }
    Ok(result.config)
}

/// Build and assemble the app described by the project configuration.
pub(crate) fn load_assembly(ctx: &Context) -> Result<Assembly> {
    let config = load_config(ctx)?;
    let app = App::from_config(&config).context("Failed to build app from configuration")?;
    app.assemble().context("Failed to assemble app")
}
