//! stack::managed
//!
//! Managed stacks and generic stacks.
//!
//! A managed stack owns one workspace (held by the base), a remote backend
//! pointing at that workspace, and its recorded managed dependencies.
//! A generic stack only takes part in deploy ordering.

use indexmap::{IndexMap, IndexSet};

use super::{BaseUnit, StackError};
use crate::core::types::{Expression, StackName, VariableName, WorkspaceName};
use crate::provider::{InputVariable, RemoteBackendConfig, Workspace, WorkspaceOptions};

/// Handle on the workspace a stack owns.
///
/// The workspace itself lives in the base unit; this is what a stack needs
/// to refer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRef {
    pub stack: StackName,
    pub name: WorkspaceName,
    /// `${tfe_workspace.<lid>.id}`
    pub id: Expression,
    /// `${tfe_workspace.<lid>}`
    pub locator: Expression,
}

impl From<&Workspace> for WorkspaceRef {
    fn from(ws: &Workspace) -> Self {
        Self {
            stack: ws.stack().clone(),
            name: ws.name().clone(),
            id: ws.id(),
            locator: ws.locator(),
        }
    }
}

/// A stack whose workspace is managed by the base.
#[derive(Debug, Clone)]
pub struct Stack {
    name: StackName,
    workspace: WorkspaceRef,
    backend: RemoteBackendConfig,
    variables: IndexMap<VariableName, InputVariable>,
    dependencies: IndexSet<StackName>,
}

impl Stack {
    /// Register `name` with the base and build the stack.
    ///
    /// The backend is derived before the workspace is provisioned so a
    /// failure leaves the base untouched.
    pub(crate) fn new(
        base: &mut BaseUnit,
        name: StackName,
        options: &WorkspaceOptions,
    ) -> Result<Self, StackError> {
        let backend = base.backend_config(name.as_str())?;
        let workspace = WorkspaceRef::from(base.provision_workspace(&name, options)?);

        Ok(Self {
            name,
            workspace,
            backend,
            variables: IndexMap::new(),
            dependencies: IndexSet::new(),
        })
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    /// The workspace this stack deploys into.
    pub fn workspace(&self) -> &WorkspaceRef {
        &self.workspace
    }

    /// Remote backend pointing at this stack's workspace.
    pub fn backend(&self) -> &RemoteBackendConfig {
        &self.backend
    }

    /// Stack-local input variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &InputVariable> {
        self.variables.values()
    }

    pub fn variable(&self, name: &VariableName) -> Option<&InputVariable> {
        self.variables.get(name)
    }

    /// Managed stacks this stack depends on, in declaration order.
    pub fn dependencies(&self) -> &IndexSet<StackName> {
        &self.dependencies
    }

    /// Record a managed dependency. Returns `false` if already recorded.
    pub(crate) fn record_dependency(&mut self, dependency: StackName) -> bool {
        self.dependencies.insert(dependency)
    }

    pub(crate) fn has_variable(&self, name: &VariableName) -> bool {
        self.variables.contains_key(name)
    }

    pub(crate) fn declare_variable(&mut self, variable: InputVariable) -> Result<(), StackError> {
        if self.variables.contains_key(&variable.name) {
            return Err(StackError::DuplicateVariable {
                stack: self.name.clone(),
                name: variable.name,
            });
        }
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }
}

/// A stack that is ordered relative to others but has no managed workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericStack {
    name: StackName,
}

impl GenericStack {
    pub(crate) fn new(name: StackName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }
}
