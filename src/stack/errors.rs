//! stack::errors
//!
//! Error types for building a multi-stack application.
//!
//! # Design
//!
//! Every error is a synchronous fault of the construction pass. Nothing is
//! retried: construction is deterministic, so the same input reproduces the
//! same fault. Re-declaring an existing dependency is not an error.
//!
//! # Example
//!
//! ```
//! use multistack::stack::StackError;
//! use multistack::core::types::ConstructPath;
//!
//! let err = StackError::MissingBase {
//!     path: ConstructPath::new("staging-vpc").unwrap(),
//! };
//! assert!(err.to_string().contains("'staging-vpc'"));
//! ```

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::types::{ConstructPath, StackName, TypeError, VariableName};
use crate::provider::ProviderError;

/// Errors from building and assembling an application.
#[derive(Debug, Error)]
pub enum StackError {
    /// No base unit is installed on the app a construct belongs to.
    #[error(
        "no base stack could be identified for the construct at path '{path}'; \
         the base stack must be installed on the same app as this construct"
    )]
    MissingBase { path: ConstructPath },

    /// A second base unit was installed.
    #[error("the app already has a base stack")]
    DuplicateBase,

    /// A stack has no workspace registered with the base.
    ///
    /// Stacks created through the app always have one, so this means the
    /// stack bypassed normal construction.
    #[error("no workspace found for stack '{stack}' in multi-stack app; this is a bug")]
    UnknownStack { stack: StackName },

    /// A stack handle does not belong to this app.
    #[error("stack '{stack}' is not part of this app")]
    NotInApp { stack: StackName },

    /// A construct path is not inside any managed stack.
    #[error("no stack could be identified for the construct at path '{path}'")]
    NoEnclosingStack { path: ConstructPath },

    /// A construct with this name already exists in the app.
    #[error("stack '{stack}' already exists in the app")]
    DuplicateStack { stack: StackName },

    /// The same variable was requested twice for one stack.
    #[error("variable '{name}' is already defined for stack '{stack}'")]
    DuplicateVariable { stack: StackName, name: VariableName },

    /// Two distinct (stack, variable) pairs render the same resource id.
    #[error(
        "variable '{name}' for stack '{stack}' renders id '{id}', already used by \
         variable '{existing_name}' for stack '{existing_stack}'"
    )]
    VariableIdCollision {
        id: String,
        stack: StackName,
        name: VariableName,
        existing_stack: StackName,
        existing_name: VariableName,
    },

    /// The naming strategy was replaced after workspaces were provisioned.
    #[error("cannot change the workspace naming strategy after workspaces have been provisioned")]
    NamerLocked,

    /// A stack declared a dependency on itself.
    #[error("stack '{stack}' cannot depend on itself")]
    SelfDependency { stack: StackName },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle between stacks: {trace}")]
    DependencyCycle { trace: String },

    /// The base prefix cannot be used in names and tags.
    #[error("invalid prefix '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidPrefix(String),

    /// The assembled app violates an invariant.
    #[error("assembled app failed verification: {0}")]
    Verification(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Type(#[from] TypeError),
}
