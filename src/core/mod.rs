//! core
//!
//! Core domain types, schemas, and checks for multistack.
//!
//! # Modules
//!
//! - [`types`] - Strong types: StackName, WorkspaceName, Expression, etc.
//! - [`graph`] - Stack dependency graph and deploy ordering
//! - [`verify`] - Fast verification of an assembled app
//! - [`naming`] - Workspace naming strategies
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - All verification is deterministic

pub mod config;
pub mod graph;
pub mod naming;
pub mod types;
pub mod verify;
