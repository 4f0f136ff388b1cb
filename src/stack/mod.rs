//! stack
//!
//! Building a multi-stack application around one base unit.
//!
//! # Modules
//!
//! - [`app`] - The app registry, roles and two-phase construction
//! - [`base`] - The base unit and workspace provisioning
//! - [`managed`] - Managed and generic stacks
//! - [`wiring`] - Remote state access between dependent stacks
//! - [`secrets`] - Secret propagation and targeted stack variables
//! - [`assembly`] - The wired, read-only result
//!
//! # Lifecycle
//!
//! ```text
//! install_base -> add_stack* -> add_dependency* -> declare variables -> assemble
//! ```
//!
//! Everything before `assemble` only records intent. `assemble` checks the
//! graph, wires the workspaces and verifies the result.

pub mod app;
pub mod assembly;
pub mod base;
mod errors;
pub mod managed;
pub mod secrets;
pub mod wiring;

pub use app::{App, Construct, Role, StackRef};
pub use assembly::Assembly;
pub use base::{BaseOptions, BaseUnit, BASE_ID};
pub use errors::StackError;
pub use managed::{GenericStack, Stack, WorkspaceRef};
pub use secrets::TargetedVariable;
pub use wiring::{DependencyWirer, WireOutcome};
