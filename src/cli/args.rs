//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>` / `-c`: Project file to use instead of `./multistack.toml`
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// multistack - Compose interdependent Terraform Cloud workspaces from one base stack
#[derive(Parser, Debug)]
#[command(name = "mstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project file to use instead of ./multistack.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Run as if mstack was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the Terraform JSON of every stack and a manifest
    Synth {
        /// Output directory
        #[arg(short, long, default_value = "multistack.out")]
        out: PathBuf,
    },

    /// Show stacks in deploy order with their dependencies
    Graph {
        /// Print the manifest as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Check the project without writing anything
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_synth_with_globals() {
        let cli = Cli::try_parse_from([
            "mstack", "synth", "--out", "build", "--config", "infra.toml", "--debug",
        ])
        .unwrap();

        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("infra.toml")));
        match cli.command {
            Command::Synth { out } => assert_eq!(out, PathBuf::from("build")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn synth_defaults_out_dir() {
        let cli = Cli::try_parse_from(["mstack", "synth"]).unwrap();
        match cli.command {
            Command::Synth { out } => assert_eq!(out, PathBuf::from("multistack.out")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn graph_json_flag() {
        let cli = Cli::try_parse_from(["mstack", "-q", "graph", "--json"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Graph { json: true }));
    }

    #[test]
    fn missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["mstack"]).is_err());
    }
}
