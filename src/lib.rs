//! multistack - Compose interdependent Terraform Cloud workspaces from one base stack
//!
//! An application consists of one base stack and any number of stacks. The
//! base provisions one remote workspace per managed stack, points each
//! stack's backend at it, grants dependent stacks read access to the state
//! they consume, and forwards secrets from its own inputs into stack
//! workspaces. The result is rendered as Terraform JSON.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`synth`] - Renders an assembled app into documents and writes them
//! - [`stack`] - App registry, base unit, stacks, wiring and secrets
//! - [`provider`] - Serializable workspace, variable and backend descriptions
//! - [`core`] - Domain types, naming, graph, verification, configuration
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! multistack maintains the following invariants:
//!
//! 1. An app has at most one base, and every managed stack has exactly one
//!    workspace whose name matches its backend
//! 2. A dependency is wired into the dependency's workspace at most once
//! 3. Secrets are passed by reference, never copied into a document
//! 4. Documents are only produced from a verified assembly

pub mod cli;
pub mod core;
pub mod provider;
pub mod stack;
pub mod synth;
pub mod ui;
