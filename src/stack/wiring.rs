//! stack::wiring
//!
//! Applies recorded managed dependencies to workspaces.
//!
//! When `cluster` depends on `vpc`, the `vpc` workspace is changed so that:
//!
//! - `cluster`'s workspace id is in its remote state consumers, letting
//!   `cluster` read `vpc`'s outputs
//! - `cluster`'s workspace is in its `depends_on`, so the consumer exists
//!   before it is referenced
//!
//! Both lists are deduplicated, so wiring the same edge twice is a no-op.

use indexmap::IndexMap;
use tracing::debug;

use super::{BaseUnit, Stack, StackError, WorkspaceRef};
use crate::core::types::StackName;

/// What wiring one edge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireOutcome {
    pub consumer_added: bool,
    pub predecessor_added: bool,
}

impl WireOutcome {
    /// Whether the dependency's workspace changed at all.
    pub fn changed(&self) -> bool {
        self.consumer_added || self.predecessor_added
    }
}

/// Wires dependency edges into the base's workspaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyWirer;

impl DependencyWirer {
    /// Let `dependent` consume the state of `dependency`.
    ///
    /// # Errors
    ///
    /// - [`StackError::UnknownStack`] if `dependency` has no workspace
    pub fn wire(
        base: &mut BaseUnit,
        dependent: &WorkspaceRef,
        dependency: &StackName,
    ) -> Result<WireOutcome, StackError> {
        let workspace =
            base.workspace_mut(dependency)
                .ok_or_else(|| StackError::UnknownStack {
                    stack: dependency.clone(),
                })?;

        let outcome = WireOutcome {
            consumer_added: workspace.add_remote_state_consumer(dependent.id.clone()),
            predecessor_added: workspace.add_predecessor(dependent.locator.clone()),
        };

        debug!(
            dependent = %dependent.stack,
            dependency = %dependency,
            changed = outcome.changed(),
            "wired remote state access"
        );
        Ok(outcome)
    }

    /// Wire every recorded dependency of every stack, in creation order.
    ///
    /// Returns the number of edges that changed a workspace.
    pub fn wire_all(
        base: &mut BaseUnit,
        stacks: &IndexMap<StackName, Stack>,
    ) -> Result<usize, StackError> {
        let mut changed = 0;
        for stack in stacks.values() {
            for dependency in stack.dependencies() {
                if Self::wire(base, stack.workspace(), dependency)?.changed() {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}
