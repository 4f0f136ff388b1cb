//! core::verify
//!
//! Fast verification of an assembled application.
//!
//! # Checks
//!
//! - The stack graph is acyclic
//! - Every managed stack has exactly one workspace, and its backend points
//!   at that workspace by name
//! - Every recorded managed dependency is wired exactly once: the
//!   dependent's id appears once in the dependency's consumers and its
//!   locator once in the dependency's `depends_on`
//! - Wiring an edge never touches the dependent's own workspace: it is
//!   neither its own consumer nor its own predecessor
//! - Every workspace variable is bound to a provisioned workspace and
//!   references an existing base parameter
//!
//! # Invariants
//!
//! - Never mutates the assembly
//! - Must be deterministic

use thiserror::Error;

use crate::stack::Assembly;

/// Errors from verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("cycle detected in stack graph: {0}")]
    CycleDetected(String),

    #[error("managed stack has no workspace: {0}")]
    WorkspaceMissing(String),

    #[error("backend of stack '{stack}' points at '{backend}' but its workspace is '{workspace}'")]
    BackendMismatch {
        stack: String,
        backend: String,
        workspace: String,
    },

    #[error("'{dependent}' appears {count} times in the consumers of '{dependency}'")]
    ConsumerCount {
        dependency: String,
        dependent: String,
        count: usize,
    },

    #[error("'{dependent}' appears {count} times in the depends_on of '{dependency}'")]
    PredecessorCount {
        dependency: String,
        dependent: String,
        count: usize,
    },

    #[error("workspace of '{stack}' lists itself as a {field} entry")]
    SelfWired { stack: String, field: &'static str },

    #[error("variable '{0}' is bound to an unknown workspace")]
    OrphanVariable(String),

    #[error("variable '{variable}' references missing base parameter '{parameter}'")]
    ParameterMissing { variable: String, parameter: String },
}

/// Result of fast verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// All errors on one line, separated by `; `.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Perform fast verification of an assembly.
pub fn verify_assembly(assembly: &Assembly) -> VerifyResult {
    let mut errors = Vec::new();

    if let Some(cycle) = assembly.graph().find_cycle() {
        errors.push(VerifyError::CycleDetected(
            super::graph::format_cycle(&cycle),
        ));
    }

    let base = assembly.base();

    for stack in assembly.stacks() {
        let Some(workspace) = base.workspace(stack.name()) else {
            errors.push(VerifyError::WorkspaceMissing(stack.name().to_string()));
            continue;
        };

        if stack.backend().workspace_name() != workspace.name() {
            errors.push(VerifyError::BackendMismatch {
                stack: stack.name().to_string(),
                backend: stack.backend().workspace_name().to_string(),
                workspace: workspace.name().to_string(),
            });
        }

        if !stack.dependencies().is_empty() {
            if workspace
                .remote_state_consumer_ids()
                .contains(&stack.workspace().id)
            {
                errors.push(VerifyError::SelfWired {
                    stack: stack.name().to_string(),
                    field: "remote_state_consumer_ids",
                });
            }
            if workspace.depends_on().contains(&stack.workspace().locator) {
                errors.push(VerifyError::SelfWired {
                    stack: stack.name().to_string(),
                    field: "depends_on",
                });
            }
        }

        for dependency in stack.dependencies() {
            let Some(target) = base.workspace(dependency) else {
                errors.push(VerifyError::WorkspaceMissing(dependency.to_string()));
                continue;
            };

            let consumers = target
                .remote_state_consumer_ids()
                .iter()
                .filter(|id| **id == stack.workspace().id)
                .count();
            if consumers != 1 {
                errors.push(VerifyError::ConsumerCount {
                    dependency: dependency.to_string(),
                    dependent: stack.name().to_string(),
                    count: consumers,
                });
            }

            let predecessors = target
                .depends_on()
                .iter()
                .filter(|loc| **loc == stack.workspace().locator)
                .count();
            if predecessors != 1 {
                errors.push(VerifyError::PredecessorCount {
                    dependency: dependency.to_string(),
                    dependent: stack.name().to_string(),
                    count: predecessors,
                });
            }
        }
    }

    for variable in base.variables() {
        if !base
            .workspaces()
            .any(|(_, ws)| ws.id() == variable.workspace_id)
        {
            errors.push(VerifyError::OrphanVariable(variable.logical_id.clone()));
        }
        if base.parameter_by_id(&variable.source).is_none() {
            errors.push(VerifyError::ParameterMissing {
                variable: variable.logical_id.clone(),
                parameter: variable.source.clone(),
            });
        }
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}
