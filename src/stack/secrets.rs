//! stack::secrets
//!
//! Passing values from the base into stack workspaces.
//!
//! A secret is declared once in the base as an input parameter and bound to
//! the target stack's workspace as a `tfe_variable` whose value references
//! that parameter. The value never appears in a document, only the
//! reference does.
//!
//! | id | example |
//! |----|---------|
//! | base parameter | `var-vpc-DB_PASSWORD` |
//! | workspace variable | `tfe-var-vpc-DB_PASSWORD` |
//! | external name | `DB_PASSWORD` |

use tracing::debug;

use super::{App, BaseUnit, StackError};
use crate::core::types::{ConstructPath, Expression, StackName, VariableName};
use crate::provider::{InputVariable, Variable, VariableCategory, VariableConfig};

impl BaseUnit {
    /// Declare a base parameter and bind it to `target`'s workspace.
    ///
    /// The workspace variable mirrors the parameter's description and
    /// sensitivity, is a Terraform (not env) variable, and is never HCL.
    ///
    /// # Errors
    ///
    /// - [`StackError::UnknownStack`] if `target` has no workspace
    /// - [`StackError::DuplicateVariable`] if `name` was already created
    ///   for `target`
    /// - [`StackError::VariableIdCollision`] if another (stack, name) pair
    ///   already renders the same parameter id
    ///
    /// # Example
    ///
    /// ```
    /// use multistack::core::types::{StackName, VariableName};
    /// use multistack::provider::{VariableConfig, WorkspaceOptions};
    /// use multistack::stack::{BaseOptions, BaseUnit};
    ///
    /// let mut base = BaseUnit::new("acme", "p", BaseOptions::default()).unwrap();
    /// let vpc = StackName::new("vpc").unwrap();
    /// base.provision_workspace(&vpc, &WorkspaceOptions::default()).unwrap();
    ///
    /// let var = base
    ///     .create_secret(&vpc, &VariableName::new("DB_PASSWORD").unwrap(), VariableConfig::sensitive())
    ///     .unwrap();
    /// assert_eq!(var.value.as_str(), "${var.DB_PASSWORD}");
    /// assert_eq!(var.sensitive, Some(true));
    /// ```
    pub fn create_secret(
        &mut self,
        target: &StackName,
        name: &VariableName,
        config: VariableConfig,
    ) -> Result<&Variable, StackError> {
        let workspace_id = self
            .workspace(target)
            .ok_or_else(|| StackError::UnknownStack {
                stack: target.clone(),
            })?
            .id();

        let key = (target.clone(), name.clone());
        if self.parameters.contains_key(&key) {
            return Err(StackError::DuplicateVariable {
                stack: target.clone(),
                name: name.clone(),
            });
        }

        // `-` may appear in both stack and variable names, so distinct
        // pairs can still render the same resource id
        let parameter_id = format!("var-{target}-{name}");
        if let Some(((stack, existing), _)) = self
            .parameters
            .iter()
            .find(|(_, parameter)| parameter.id == parameter_id)
        {
            return Err(StackError::VariableIdCollision {
                id: parameter_id,
                stack: target.clone(),
                name: name.clone(),
                existing_stack: stack.clone(),
                existing_name: existing.clone(),
            });
        }

        let parameter = InputVariable {
            id: parameter_id.clone(),
            name: name.clone(),
            config,
        };
        let variable = Variable {
            logical_id: format!("tfe-var-{target}-{name}"),
            source: parameter_id,
            key: name.clone(),
            value: parameter.value_ref(),
            category: VariableCategory::Terraform,
            description: parameter.config.description.clone(),
            hcl: false,
            sensitive: parameter.config.sensitive,
            workspace_id,
        };

        debug!(stack = %target, variable = %name, "propagated secret");

        self.parameters.insert(key.clone(), parameter);
        let (idx, _) = self.variables.insert_full(key, variable);
        Ok(&self.variables[idx])
    }

    /// Whether a secret named `name` was created for `target`.
    pub fn has_secret(&self, target: &StackName, name: &VariableName) -> bool {
        self.parameters
            .contains_key(&(target.clone(), name.clone()))
    }
}

/// A stack input variable whose value is supplied by the base.
///
/// Declaring one adds a local `variable` block to the enclosing stack and
/// a matching secret in the base, so the workspace gets the value at run
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedVariable {
    stack: StackName,
    name: VariableName,
    value: Expression,
}

impl TargetedVariable {
    /// Declare a variable at `scope`.
    ///
    /// `scope` is any path inside a managed stack; the stack is found by
    /// walking up from it.
    ///
    /// # Errors
    ///
    /// - [`StackError::NoEnclosingStack`] if `scope` is outside managed stacks
    /// - [`StackError::MissingBase`] if the app has no base
    /// - [`StackError::DuplicateVariable`] if the stack already declares `name`
    pub fn declare(
        app: &mut App,
        scope: &ConstructPath,
        name: &str,
        config: VariableConfig,
    ) -> Result<Self, StackError> {
        let stack = app.stack_of(scope)?.name().clone();
        app.base_of(scope)?;
        let name = VariableName::new(name)?;

        let (base, target) = app.base_and_stack_mut(&stack)?;
        if target.has_variable(&name) {
            return Err(StackError::DuplicateVariable { stack, name });
        }

        base.create_secret(&stack, &name, config.clone())?;

        let local = InputVariable {
            id: name.as_str().to_string(),
            name: name.clone(),
            config,
        };
        let value = local.value_ref();
        target.declare_variable(local)?;

        Ok(Self { stack, name, value })
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    pub fn name(&self) -> &VariableName {
        &self.name
    }

    /// Reference to the variable inside its stack.
    pub fn value(&self) -> &Expression {
        &self.value
    }
}
