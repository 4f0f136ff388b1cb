//! stack::assembly
//!
//! The frozen, wired result of [`App::assemble`](super::App::assemble).
//!
//! An assembly is read-only: every dependency is wired, the graph is
//! acyclic, and the deploy order is fixed. Synthesis and verification
//! both work from it.

use indexmap::IndexMap;

use super::{BaseUnit, GenericStack, Role, Stack};
use crate::core::graph::StackGraph;
use crate::core::types::StackName;
use crate::provider::Workspace;

/// A wired application ready for synthesis.
#[derive(Debug)]
pub struct Assembly {
    base: BaseUnit,
    stacks: IndexMap<StackName, Stack>,
    generic: IndexMap<StackName, GenericStack>,
    graph: StackGraph,
    order: Vec<StackName>,
}

impl Assembly {
    pub(crate) fn new(
        base: BaseUnit,
        stacks: IndexMap<StackName, Stack>,
        generic: IndexMap<StackName, GenericStack>,
        graph: StackGraph,
        order: Vec<StackName>,
    ) -> Self {
        Self {
            base,
            stacks,
            generic,
            graph,
            order,
        }
    }

    #[cfg(test)]
    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        BaseUnit,
        IndexMap<StackName, Stack>,
        IndexMap<StackName, GenericStack>,
        StackGraph,
        Vec<StackName>,
    ) {
        (self.base, self.stacks, self.generic, self.graph, self.order)
    }

    pub fn base(&self) -> &BaseUnit {
        &self.base
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

    /// Workspace of a managed stack, as wired.
    pub fn workspace(&self, stack: &str) -> Option<&Workspace> {
        StackName::new(stack)
            .ok()
            .and_then(|name| self.base.workspace(&name))
    }

    pub fn graph(&self) -> &StackGraph {
        &self.graph
    }

    /// Stacks in deploy order, dependencies first.
    ///
    /// The base is not included; it always deploys before every stack.
    pub fn deploy_order(&self) -> &[StackName] {
        &self.order
    }

    /// Role of a stack, `None` if the name is unknown.
    pub fn role_of(&self, stack: &StackName) -> Option<Role> {
        if self.stacks.contains_key(stack) {
            Some(Role::ManagedStack)
        } else if self.generic.contains_key(stack) {
            Some(Role::Other)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::stack::{App, BaseOptions, BaseUnit, Role};

    #[test]
    fn deploy_order_puts_dependencies_first() {
        let mut app = App::new();
        app.install_base(BaseUnit::new("acme", "p", BaseOptions::default()).unwrap())
            .unwrap();
        let app_stack = app.add_stack("app", None).unwrap();
        let dns = app.add_generic_stack("dns").unwrap();
        let vpc = app.add_stack("vpc", None).unwrap();
        app.add_dependency(&app_stack, &vpc).unwrap();
        app.add_dependency(&app_stack, &dns).unwrap();

        let assembly = app.assemble().unwrap();
        let order: Vec<_> = assembly
            .deploy_order()
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(order, vec!["dns", "vpc", "app"]);

        assert_eq!(assembly.role_of(dns.name()), Some(Role::Other));
        assert_eq!(assembly.role_of(vpc.name()), Some(Role::ManagedStack));
        assert!(assembly.workspace("dns").is_none());
        assert!(assembly.workspace("vpc").is_some());
        assert!(assembly.workspace("not a name").is_none());
        assert_eq!(assembly.stack("app").unwrap().name(), app_stack.name());
        assert!(assembly.stack("dns").is_none());
    }
}
