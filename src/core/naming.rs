//! core::naming
//!
//! Workspace naming rules.
//!
//! # Features
//!
//! - Default `{prefix}-{stack}` naming
//! - Template naming from configuration
//! - Arbitrary naming through a closure
//!
//! The same namer computes both the provisioned workspace name and the
//! backend pointer of a stack, so overriding it changes both identically.

use super::types::{TypeError, WorkspaceName};

/// Placeholder for the base prefix in naming templates.
pub const PREFIX_PLACEHOLDER: &str = "{prefix}";

/// Placeholder for the stack name in naming templates.
pub const STACK_PLACEHOLDER: &str = "{stack}";

/// Strategy that maps a stack name to its remote workspace name.
pub trait WorkspaceNamer: std::fmt::Debug {
    /// Compute the raw workspace name for `stack` under `prefix`.
    fn name(&self, prefix: &str, stack: &str) -> String;

    /// Compute and validate the workspace name.
    fn workspace_name(&self, prefix: &str, stack: &str) -> Result<WorkspaceName, TypeError> {
        WorkspaceName::new(self.name(prefix, stack))
    }
}

/// Default naming: `{prefix}-{stack}`.
///
/// # Example
///
/// ```
/// use multistack::core::naming::{PrefixNamer, WorkspaceNamer};
///
/// let name = PrefixNamer.workspace_name("my-prefix", "staging-vpc").unwrap();
/// assert_eq!(name.as_str(), "my-prefix-staging-vpc");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixNamer;

impl WorkspaceNamer for PrefixNamer {
    fn name(&self, prefix: &str, stack: &str) -> String {
        format!("{prefix}-{stack}")
    }
}

/// Naming from a template with `{prefix}` and `{stack}` placeholders.
///
/// # Example
///
/// ```
/// use multistack::core::naming::{TemplateNamer, WorkspaceNamer};
///
/// let namer = TemplateNamer::new("our-{stack}").unwrap();
/// assert_eq!(namer.name("ignored", "staging-vpc"), "our-staging-vpc");
///
/// // A template without {stack} would map every stack to one workspace
/// assert!(TemplateNamer::new("{prefix}-fixed").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNamer {
    template: String,
}

impl TemplateNamer {
    /// Create a template namer.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidWorkspaceName` if the template does not
    /// reference `{stack}`.
    pub fn new(template: impl Into<String>) -> Result<Self, TypeError> {
        let template = template.into();
        if !template.contains(STACK_PLACEHOLDER) {
            return Err(TypeError::InvalidWorkspaceName(format!(
                "naming template '{template}' must contain {STACK_PLACEHOLDER}"
            )));
        }
        Ok(Self { template })
    }

    /// The raw template string.
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl WorkspaceNamer for TemplateNamer {
    fn name(&self, prefix: &str, stack: &str) -> String {
        self.template
            .replace(PREFIX_PLACEHOLDER, prefix)
            .replace(STACK_PLACEHOLDER, stack)
    }
}

/// Naming through an arbitrary function of `(prefix, stack)`.
pub struct FnNamer(Box<dyn Fn(&str, &str) -> String>);

impl FnNamer {
    /// Wrap a naming function.
    pub fn new(f: impl Fn(&str, &str) -> String + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl std::fmt::Debug for FnNamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnNamer(..)")
    }
}

impl WorkspaceNamer for FnNamer {
    fn name(&self, prefix: &str, stack: &str) -> String {
        (self.0)(prefix, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_namer_joins_with_dash() {
        assert_eq!(PrefixNamer.name("p", "vpc"), "p-vpc");
        assert_eq!(PrefixNamer.name("p", "base"), "p-base");
    }

    #[test]
    fn template_replaces_all_placeholders() {
        let namer = TemplateNamer::new("{prefix}_{stack}_{prefix}").unwrap();
        assert_eq!(namer.name("p", "vpc"), "p_vpc_p");
    }

    #[test]
    fn template_requires_stack() {
        assert!(TemplateNamer::new("static").is_err());
    }

    #[test]
    fn fn_namer_calls_closure() {
        let namer = FnNamer::new(|_, stack| format!("our-{stack}"));
        assert_eq!(namer.name("p", "vpc"), "our-vpc");
        assert_eq!(format!("{:?}", namer), "FnNamer(..)");
    }

    #[test]
    fn invalid_output_is_rejected() {
        let namer = FnNamer::new(|_, stack| format!("our.{stack}"));
        assert!(namer.workspace_name("p", "vpc").is_err());
    }
}
