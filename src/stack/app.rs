//! stack::app
//!
//! The application: an explicit registry of the base unit and every stack.
//!
//! # Construction
//!
//! Building an app happens in two phases:
//!
//! 1. Registration: the base is installed, stacks are added, dependencies
//!    are recorded. Nothing outside the registry is touched yet.
//! 2. [`App::assemble`]: the dependency graph is checked for cycles, every
//!    recorded managed dependency is wired into the workspaces, and the
//!    result is verified before an [`Assembly`] is handed out.
//!
//! There is no ambient state. Every lookup takes the app explicitly, and
//! the base is found by role rather than by scanning for a marker.
//!
//! # Example
//!
//! ```
//! use multistack::stack::{App, BaseOptions, BaseUnit};
//!
//! let mut app = App::new();
//! app.install_base(BaseUnit::new("acme", "p", BaseOptions::default()).unwrap())
//!     .unwrap();
//!
//! let vpc = app.add_stack("vpc", None).unwrap();
//! let cluster = app.add_stack("cluster", None).unwrap();
//! app.add_dependency(&cluster, &vpc).unwrap();
//!
//! let assembly = app.assemble().unwrap();
//! let vpc_ws = assembly.workspace("vpc").unwrap();
//! assert_eq!(
//!     vpc_ws.remote_state_consumer_ids()[0].as_str(),
//!     "${tfe_workspace.tfe-multi-stack-workspace-cluster.id}"
//! );
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::debug;

use super::base::BASE_ID;
use super::{Assembly, BaseOptions, BaseUnit, DependencyWirer, GenericStack, Stack, StackError};
use crate::core::config::Config;
use crate::core::graph::{format_cycle, StackGraph};
use crate::core::naming::TemplateNamer;
use crate::core::types::{ConstructPath, StackName};
use crate::core::verify;
use crate::provider::{Variable, VariableConfig, WorkspaceOptions};

/// Role of an app child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The coordinating base unit
    Base,
    /// A stack with a workspace managed by the base
    ManagedStack,
    /// Any other stack; ordered, never wired
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Base => "base",
            Role::ManagedStack => "managed",
            Role::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that lives somewhere in the app's construct tree.
pub trait Construct {
    /// Path from the app root.
    fn path(&self) -> ConstructPath;

    fn role(&self) -> Role {
        Role::Other
    }
}

impl Construct for ConstructPath {
    fn path(&self) -> ConstructPath {
        self.clone()
    }
}

impl Construct for BaseUnit {
    fn path(&self) -> ConstructPath {
        ConstructPath::root().child(BASE_ID)
    }

    fn role(&self) -> Role {
        Role::Base
    }
}

impl Construct for Stack {
    fn path(&self) -> ConstructPath {
        ConstructPath::from(self.name())
    }

    fn role(&self) -> Role {
        Role::ManagedStack
    }
}

impl Construct for GenericStack {
    fn path(&self) -> ConstructPath {
        ConstructPath::from(self.name())
    }
}

/// Handle returned when a stack is added to an app.
///
/// A handle is tied to the app that issued it, so a same-named stack of
/// another app is not accepted in its place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackRef {
    app: u64,
    name: StackName,
    role: Role,
}

impl StackRef {
    pub fn name(&self) -> &StackName {
        &self.name
    }
}

impl Construct for StackRef {
    fn path(&self) -> ConstructPath {
        ConstructPath::from(&self.name)
    }

    fn role(&self) -> Role {
        self.role
    }
}

static NEXT_APP_ID: AtomicU64 = AtomicU64::new(1);

/// Registry of the base unit and all stacks of one application.
#[derive(Debug)]
pub struct App {
    /// Process-unique, stamped into every issued [`StackRef`]
    id: u64,
    base: Option<BaseUnit>,
    /// Top-level construct ids in creation order
    children: IndexMap<String, Role>,
    stacks: IndexMap<StackName, Stack>,
    generic: IndexMap<StackName, GenericStack>,
    graph: StackGraph,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            id: NEXT_APP_ID.fetch_add(1, Ordering::Relaxed),
            base: None,
            children: IndexMap::new(),
            stacks: IndexMap::new(),
            generic: IndexMap::new(),
            graph: StackGraph::new(),
        }
    }

    /// Build an app from a loaded project configuration.
    ///
    /// Stacks are added in file order, then dependencies are recorded, then
    /// stack variables are declared and propagated as secrets.
    pub fn from_config(config: &Config) -> Result<Self, StackError> {
        let options = BaseOptions {
            hostname: config.hostname(),
            token: config.token(),
            ssl_skip_verify: config.ssl_skip_verify(),
            default_workspace: config.project.default_workspace.clone(),
        };
        let mut base = BaseUnit::new(config.organization()?, config.prefix()?, options)?;
        if let Some(template) = config.workspace_name_template() {
            base = base.with_namer(TemplateNamer::new(template)?)?;
        }

        let mut app = App::new();
        app.install_base(base)?;

        let mut refs = IndexMap::new();
        for stack in config.stacks() {
            let handle = if stack.managed {
                app.add_stack(&stack.name, stack.workspace.clone())?
            } else {
                app.add_generic_stack(&stack.name)?
            };
            refs.insert(stack.name.as_str(), handle);
        }

        for stack in config.stacks() {
            let dependent = &refs[stack.name.as_str()];
            for dependency in &stack.depends_on {
                let Some(dependency) = refs.get(dependency.as_str()) else {
                    return Err(StackError::NotInApp {
                        stack: StackName::new(dependency.as_str())?,
                    });
                };
                app.add_dependency(dependent, dependency)?;
            }
        }

        for stack in config.stacks() {
            let scope = refs[stack.name.as_str()].path();
            for variable in &stack.variables {
                super::TargetedVariable::declare(
                    &mut app,
                    &scope.child(&variable.name),
                    &variable.name,
                    variable.config(),
                )?;
            }
        }

        Ok(app)
    }

    /// Install the base unit.
    ///
    /// # Errors
    ///
    /// - [`StackError::DuplicateBase`] if a base is already installed
    pub fn install_base(&mut self, base: BaseUnit) -> Result<(), StackError> {
        if self.base.is_some() || self.children.contains_key(BASE_ID) {
            return Err(StackError::DuplicateBase);
        }
        debug!(
            organization = %base.organization(),
            prefix = base.prefix(),
            "installed base stack"
        );
        self.children.insert(BASE_ID.to_string(), Role::Base);
        self.base = Some(base);
        Ok(())
    }

    /// Find the base unit of the app `node` belongs to.
    ///
    /// The base is the child with [`Role::Base`]; there is at most one.
    ///
    /// # Errors
    ///
    /// - [`StackError::MissingBase`] if no base is installed
    pub fn base_of(&self, node: &impl Construct) -> Result<&BaseUnit, StackError> {
        let has_base = self.children.values().any(|role| *role == Role::Base);
        match (&self.base, has_base) {
            (Some(base), true) => Ok(base),
            _ => Err(StackError::MissingBase { path: node.path() }),
        }
    }

    fn base_of_mut(&mut self, node: &impl Construct) -> Result<&mut BaseUnit, StackError> {
        let path = node.path();
        self.base
            .as_mut()
            .ok_or(StackError::MissingBase { path })
    }

    /// The installed base, if any.
    pub fn base(&self) -> Option<&BaseUnit> {
        self.base.as_ref()
    }

    /// Find the managed stack enclosing `path`.
    ///
    /// Walks from `path` up to the root and returns the first managed
    /// stack found.
    pub fn stack_of(&self, path: &ConstructPath) -> Result<&Stack, StackError> {
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if let Some(stack) = self
                .stacks
                .values()
                .find(|stack| stack.path() == p)
            {
                return Ok(stack);
            }
            current = p.parent();
        }
        Err(StackError::NoEnclosingStack { path: path.clone() })
    }

    /// Add a managed stack and provision its workspace.
    ///
    /// # Errors
    ///
    /// - Invalid stack name
    /// - [`StackError::DuplicateStack`] if the id is taken
    /// - [`StackError::MissingBase`] if no base is installed
    /// - Invalid workspace options
    pub fn add_stack(
        &mut self,
        name: &str,
        options: Option<WorkspaceOptions>,
    ) -> Result<StackRef, StackError> {
        let name = self.claim(name)?;
        let path = ConstructPath::from(&name);
        let options = options.unwrap_or_default();

        let stack = Stack::new(self.base_of_mut(&path)?, name.clone(), &options)?;
        debug!(stack = %name, "added managed stack");

        self.children
            .insert(name.as_str().to_string(), Role::ManagedStack);
        self.graph.add_node(name.clone());
        self.stacks.insert(name.clone(), stack);

        Ok(StackRef {
            app: self.id,
            name,
            role: Role::ManagedStack,
        })
    }

    /// Add a stack that only takes part in deploy ordering.
    pub fn add_generic_stack(&mut self, name: &str) -> Result<StackRef, StackError> {
        let name = self.claim(name)?;
        debug!(stack = %name, "added generic stack");

        self.children.insert(name.as_str().to_string(), Role::Other);
        self.graph.add_node(name.clone());
        self.generic
            .insert(name.clone(), GenericStack::new(name.clone()));

        Ok(StackRef {
            app: self.id,
            name,
            role: Role::Other,
        })
    }

    fn claim(&self, name: &str) -> Result<StackName, StackError> {
        let name = StackName::new(name)?;
        if self.children.contains_key(name.as_str()) {
            return Err(StackError::DuplicateStack { stack: name });
        }
        Ok(name)
    }

    /// Declare that `dependent` deploys after `dependency`.
    ///
    /// The ordering edge is always recorded. When both sides are managed
    /// stacks the dependency is also recorded for wiring at assembly time.
    /// Returns `true` if the edge is new.
    ///
    /// # Errors
    ///
    /// - [`StackError::NotInApp`] if either handle belongs elsewhere
    /// - [`StackError::SelfDependency`] if both handles are the same stack
    pub fn add_dependency(
        &mut self,
        dependent: &StackRef,
        dependency: &StackRef,
    ) -> Result<bool, StackError> {
        self.check_owned(dependent)?;
        self.check_owned(dependency)?;
        if dependent.name == dependency.name {
            return Err(StackError::SelfDependency {
                stack: dependent.name.clone(),
            });
        }

        if dependent.role == Role::ManagedStack && dependency.role == Role::ManagedStack {
            if let Some(stack) = self.stacks.get_mut(&dependent.name) {
                stack.record_dependency(dependency.name.clone());
            }
        }

        let added = self
            .graph
            .add_edge(dependent.name.clone(), dependency.name.clone());
        debug!(
            dependent = %dependent.name,
            dependency = %dependency.name,
            new = added,
            "recorded dependency"
        );
        Ok(added)
    }

    fn check_owned(&self, handle: &StackRef) -> Result<(), StackError> {
        if handle.app != self.id || self.children.get(handle.name.as_str()) != Some(&handle.role) {
            return Err(StackError::NotInApp {
                stack: handle.name.clone(),
            });
        }
        Ok(())
    }

    /// Propagate a secret from the base into `target`'s workspace.
    ///
    /// See [`BaseUnit::create_secret`].
    ///
    /// # Errors
    ///
    /// - [`StackError::NotInApp`] if `target` belongs elsewhere
    pub fn create_secret(
        &mut self,
        target: &StackRef,
        name: &str,
        config: VariableConfig,
    ) -> Result<&Variable, StackError> {
        self.check_owned(target)?;
        let name = crate::core::types::VariableName::new(name)?;
        self.base_of_mut(target)?
            .create_secret(&target.name, &name, config)
    }

    /// Managed stack by name.
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        StackName::new(name)
            .ok()
            .and_then(|name| self.stacks.get(&name))
    }

    /// Managed stacks in creation order.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Generic stacks in creation order.
    pub fn generic_stacks(&self) -> impl Iterator<Item = &GenericStack> {
        self.generic.values()
    }

    /// Top-level children with their roles, in creation order.
    pub fn children(&self) -> impl Iterator<Item = (&str, Role)> {
        self.children.iter().map(|(id, role)| (id.as_str(), *role))
    }

    /// The ordering graph over all stacks.
    pub fn graph(&self) -> &StackGraph {
        &self.graph
    }

    /// Split borrow used when a stack and the base change together.
    pub(crate) fn base_and_stack_mut(
        &mut self,
        stack: &StackName,
    ) -> Result<(&mut BaseUnit, &mut Stack), StackError> {
        let path = ConstructPath::from(stack);
        let base = self
            .base
            .as_mut()
            .ok_or(StackError::MissingBase { path })?;
        let stack = self
            .stacks
            .get_mut(stack)
            .ok_or_else(|| StackError::UnknownStack {
                stack: stack.clone(),
            })?;
        Ok((base, stack))
    }

    /// Wire recorded dependencies and verify the result.
    ///
    /// # Errors
    ///
    /// - [`StackError::MissingBase`] if no base is installed
    /// - [`StackError::DependencyCycle`] if the stacks cannot be ordered
    /// - [`StackError::Verification`] if the wired app breaks an invariant
    pub fn assemble(self) -> Result<Assembly, StackError> {
        let App {
            id: _,
            base,
            children: _,
            stacks,
            generic,
            graph,
        } = self;

        let mut base = base.ok_or(StackError::MissingBase {
            path: ConstructPath::root(),
        })?;

        if let Some(cycle) = graph.find_cycle() {
            return Err(StackError::DependencyCycle {
                trace: format_cycle(&cycle),
            });
        }

        let wired = DependencyWirer::wire_all(&mut base, &stacks)?;
        debug!(edges = wired, "wired managed dependencies");

        let order = graph.topological_order();
        let assembly = Assembly::new(base, stacks, generic, graph, order);

        let report = verify::verify_assembly(&assembly);
        if !report.is_ok() {
            return Err(StackError::Verification(report.summary()));
        }
        Ok(assembly)
    }
}
