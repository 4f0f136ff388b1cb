//! stack::base
//!
//! The base unit: the one coordinating stack of an application.
//!
//! # Responsibilities
//!
//! - Holds the organization, prefix and provider connection
//! - Computes workspace names through a pluggable [`WorkspaceNamer`]
//! - Provisions one workspace per stack and keeps the stack -> workspace
//!   mapping in insertion order
//! - Derives the remote backend pointer of every stack
//!
//! Secret propagation lives in [`super::secrets`] and extends this type.
//!
//! # Invariants
//!
//! - A stack name maps to at most one workspace; provisioning a stack twice
//!   is rejected with [`StackError::DuplicateStack`]
//! - Workspace name and backend workspace name are computed by the same
//!   namer, so they always agree

use indexmap::IndexMap;
use tracing::debug;

use super::StackError;
use crate::core::naming::{PrefixNamer, WorkspaceNamer};
use crate::core::types::{OrganizationName, StackName, VariableName, WorkspaceName};
use crate::provider::{
    BackendWorkspace, InputVariable, OrganizationData, ProviderConfig, RemoteBackendConfig,
    Variable, Workspace, WorkspaceOptions,
};

/// Construct id of the base unit inside the app.
pub const BASE_ID: &str = "base";

/// Connection settings and defaults of the base unit.
#[derive(Clone, Default, PartialEq)]
pub struct BaseOptions {
    /// Remote hostname (provider default when unset)
    pub hostname: Option<String>,
    /// API token
    pub token: Option<String>,
    /// Skip TLS verification
    pub ssl_skip_verify: Option<bool>,
    /// Defaults merged into every stack's workspace options
    pub default_workspace: Option<WorkspaceOptions>,
}

impl std::fmt::Debug for BaseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseOptions")
            .field("hostname", &self.hostname)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ssl_skip_verify", &self.ssl_skip_verify)
            .field("default_workspace", &self.default_workspace)
            .finish()
    }
}

/// The single base unit of an application.
///
/// # Example
///
/// ```
/// use multistack::stack::{BaseOptions, BaseUnit};
/// use multistack::core::types::StackName;
/// use multistack::provider::WorkspaceOptions;
///
/// let mut base = BaseUnit::new("acme", "p", BaseOptions::default()).unwrap();
/// let vpc = StackName::new("vpc").unwrap();
///
/// let ws = base.provision_workspace(&vpc, &WorkspaceOptions::default()).unwrap();
/// assert_eq!(ws.name().as_str(), "p-vpc");
/// assert_eq!(ws.tag_names(), &["p"]);
///
/// let backend = base.backend_config("vpc").unwrap();
/// assert_eq!(backend.workspace_name().as_str(), "p-vpc");
/// ```
#[derive(Debug)]
pub struct BaseUnit {
    pub(super) organization: OrganizationData,
    pub(super) prefix: String,
    pub(super) options: BaseOptions,
    pub(super) namer: Box<dyn WorkspaceNamer>,
    pub(super) workspaces: IndexMap<StackName, Workspace>,
    /// Base-level input parameters, keyed by target stack and name
    pub(super) parameters: IndexMap<(StackName, VariableName), InputVariable>,
    /// Workspace variables, keyed by target stack and name
    pub(super) variables: IndexMap<(StackName, VariableName), Variable>,
}

impl BaseUnit {
    /// Create a base unit with the default `{prefix}-{stack}` naming.
    ///
    /// # Errors
    ///
    /// - Invalid organization name or prefix
    /// - Invalid default workspace options
    pub fn new(organization: &str, prefix: &str, options: BaseOptions) -> Result<Self, StackError> {
        let organization = OrganizationName::new(organization)?;

        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StackError::InvalidPrefix(prefix.to_string()));
        }

        if let Some(defaults) = &options.default_workspace {
            defaults.validate()?;
        }

        let base = Self {
            organization: OrganizationData::new(organization),
            prefix: prefix.to_string(),
            options,
            namer: Box::new(PrefixNamer),
            workspaces: IndexMap::new(),
            parameters: IndexMap::new(),
            variables: IndexMap::new(),
        };
        base.workspace_name(BASE_ID)?;
        Ok(base)
    }

    /// Replace the naming strategy.
    ///
    /// # Errors
    ///
    /// - [`StackError::NamerLocked`] if workspaces were already provisioned
    ///   under the old namer
    /// - [`StackError::Type`] if the namer cannot name the base's own
    ///   workspace
    ///
    /// # Example
    ///
    /// ```
    /// use multistack::core::naming::FnNamer;
    /// use multistack::stack::{BaseOptions, BaseUnit};
    ///
    /// let base = BaseUnit::new("acme", "p", BaseOptions::default())
    ///     .unwrap()
    ///     .with_namer(FnNamer::new(|_, stack| format!("our-{stack}")))
    ///     .unwrap();
    /// assert_eq!(base.own_backend().unwrap().workspace_name().as_str(), "our-base");
    /// ```
    pub fn with_namer(mut self, namer: impl WorkspaceNamer + 'static) -> Result<Self, StackError> {
        if !self.workspaces.is_empty() {
            return Err(StackError::NamerLocked);
        }
        namer.workspace_name(&self.prefix, BASE_ID)?;
        self.namer = Box::new(namer);
        Ok(self)
    }

    /// Organization name.
    pub fn organization(&self) -> &OrganizationName {
        &self.organization.name
    }

    /// Organization data source.
    pub fn organization_data(&self) -> &OrganizationData {
        &self.organization
    }

    /// Name prefix, also used as the first workspace tag.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Connection settings and defaults.
    pub fn options(&self) -> &BaseOptions {
        &self.options
    }

    /// The `provider "tfe"` block.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            hostname: self.options.hostname.clone(),
            token: self.options.token.clone(),
            ssl_skip_verify: self.options.ssl_skip_verify,
        }
    }

    /// Compute the workspace name of a stack.
    pub fn workspace_name(&self, stack: &str) -> Result<WorkspaceName, StackError> {
        Ok(self.namer.workspace_name(&self.prefix, stack)?)
    }

    /// Derive the remote backend pointer of a stack.
    pub fn backend_config(&self, stack: &str) -> Result<RemoteBackendConfig, StackError> {
        Ok(RemoteBackendConfig {
            hostname: self.options.hostname.clone(),
            organization: self.organization.name.clone(),
            token: self.options.token.clone(),
            workspaces: BackendWorkspace {
                name: self.workspace_name(stack)?,
            },
        })
    }

    /// Backend pointer of the base itself.
    pub fn own_backend(&self) -> Result<RemoteBackendConfig, StackError> {
        self.backend_config(BASE_ID)
    }

    /// Provision the workspace of `stack`.
    ///
    /// Base defaults are merged with `options` (per-stack fields win), the
    /// prefix tag is put ahead of the merged tags, and the workspace is
    /// registered under the stack name.
    ///
    /// # Errors
    ///
    /// - [`StackError::DuplicateStack`] if the stack already has a workspace
    /// - Invalid options or an invalid computed name
    pub fn provision_workspace(
        &mut self,
        stack: &StackName,
        options: &WorkspaceOptions,
    ) -> Result<&Workspace, StackError> {
        if self.workspaces.contains_key(stack) {
            return Err(StackError::DuplicateStack {
                stack: stack.clone(),
            });
        }
        options.validate()?;

        let merged = match &self.options.default_workspace {
            Some(defaults) => defaults.merged_with(options),
            None => options.clone(),
        };
        let name = self.workspace_name(stack.as_str())?;
        let workspace = Workspace::new(
            stack.clone(),
            name,
            self.organization.name_ref(),
            &self.prefix,
            merged,
        );

        debug!(
            stack = %stack,
            workspace = %workspace.name(),
            "provisioned workspace"
        );

        let (idx, _) = self.workspaces.insert_full(stack.clone(), workspace);
        Ok(&self.workspaces[idx])
    }

    /// Workspace provisioned for a stack.
    pub fn workspace(&self, stack: &StackName) -> Option<&Workspace> {
        self.workspaces.get(stack)
    }

    pub(crate) fn workspace_mut(&mut self, stack: &StackName) -> Option<&mut Workspace> {
        self.workspaces.get_mut(stack)
    }

    /// All workspaces in provisioning order.
    pub fn workspaces(&self) -> impl Iterator<Item = (&StackName, &Workspace)> {
        self.workspaces.iter()
    }

    /// Number of provisioned workspaces.
    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    /// Base-level input parameters in creation order.
    pub fn parameters(&self) -> impl Iterator<Item = &InputVariable> {
        self.parameters.values()
    }

    /// Base-level input parameter created for `stack` under `name`.
    pub fn parameter(&self, stack: &StackName, name: &VariableName) -> Option<&InputVariable> {
        self.parameters.get(&(stack.clone(), name.clone()))
    }

    /// Base-level input parameter by rendered id, e.g. `var-vpc-DB_PASSWORD`.
    pub fn parameter_by_id(&self, id: &str) -> Option<&InputVariable> {
        self.parameters.values().find(|p| p.id == id)
    }

    /// Workspace variables in creation order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    #[cfg(test)]
    pub(crate) fn forget_workspace(&mut self, stack: &StackName) -> Option<Workspace> {
        self.workspaces.shift_remove(stack)
    }

    #[cfg(test)]
    pub(crate) fn forget_parameter(
        &mut self,
        stack: &StackName,
        name: &VariableName,
    ) -> Option<InputVariable> {
        self.parameters.shift_remove(&(stack.clone(), name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::TemplateNamer;

    fn base(options: BaseOptions) -> BaseUnit {
        BaseUnit::new("my-company", "my-prefix", options).unwrap()
    }

    fn name(s: &str) -> StackName {
        StackName::new(s).unwrap()
    }

    #[test]
    fn rejects_bad_prefix() {
        assert!(matches!(
            BaseUnit::new("acme", "", BaseOptions::default()),
            Err(StackError::InvalidPrefix(_))
        ));
        assert!(matches!(
            BaseUnit::new("acme", "a b", BaseOptions::default()),
            Err(StackError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn rejects_bad_organization() {
        assert!(matches!(
            BaseUnit::new("", "p", BaseOptions::default()),
            Err(StackError::Type(_))
        ));
    }

    #[test]
    fn rejects_invalid_defaults() {
        let options = BaseOptions {
            default_workspace: Some(WorkspaceOptions {
                execution_mode: Some("bogus".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            BaseUnit::new("acme", "p", options),
            Err(StackError::Provider(_))
        ));
    }

    #[test]
    fn backend_config_carries_connection() {
        let base = base(BaseOptions {
            hostname: Some("app.terraform.io".into()),
            token: Some("my-token".into()),
            ..Default::default()
        });

        let backend = base.backend_config("staging-vpc").unwrap();
        assert_eq!(backend.hostname.as_deref(), Some("app.terraform.io"));
        assert_eq!(backend.token.as_deref(), Some("my-token"));
        assert_eq!(backend.organization.as_str(), "my-company");
        assert_eq!(backend.workspace_name().as_str(), "my-prefix-staging-vpc");

        assert_eq!(
            base.own_backend().unwrap().workspace_name().as_str(),
            "my-prefix-base"
        );
    }

    #[test]
    fn provision_merges_defaults_and_tags() {
        let mut base = base(BaseOptions {
            default_workspace: Some(WorkspaceOptions {
                tag_names: Some(vec!["another-tag".into()]),
                agent_pool_id: Some("42".into()),
                queue_all_runs: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        });

        let staging = base
            .provision_workspace(
                &name("staging-vpc"),
                &WorkspaceOptions {
                    execution_mode: Some("remote".into()),
                    tag_names: Some(vec!["staging-tag".into()]),
                    ..Default::default()
                },
            )
            .unwrap()
            .clone();
        assert_eq!(staging.tag_names(), &["my-prefix", "staging-tag"]);
        assert_eq!(staging.options().agent_pool_id.as_deref(), Some("42"));
        assert_eq!(staging.options().execution_mode.as_deref(), Some("remote"));

        let production = base
            .provision_workspace(&name("production-vpc"), &WorkspaceOptions::default())
            .unwrap();
        assert_eq!(production.tag_names(), &["my-prefix", "another-tag"]);
        assert_eq!(production.options().queue_all_runs, Some(true));
        assert!(production.options().execution_mode.is_none());
    }

    #[test]
    fn provision_twice_is_rejected() {
        let mut base = base(BaseOptions::default());
        base.provision_workspace(&name("vpc"), &WorkspaceOptions::default())
            .unwrap();

        let err = base
            .provision_workspace(&name("vpc"), &WorkspaceOptions::default())
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateStack { .. }));
        assert_eq!(base.workspace_count(), 1);
    }

    #[test]
    fn provision_keeps_insertion_order() {
        let mut base = base(BaseOptions::default());
        for s in ["c", "a", "b"] {
            base.provision_workspace(&name(s), &WorkspaceOptions::default())
                .unwrap();
        }
        let order: Vec<_> = base.workspaces().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn template_namer_applies_to_workspace_and_backend() {
        let mut base = base(BaseOptions::default())
            .with_namer(TemplateNamer::new("our-{stack}").unwrap())
            .unwrap();

        let ws = base
            .provision_workspace(&name("staging-vpc"), &WorkspaceOptions::default())
            .unwrap();
        assert_eq!(ws.name().as_str(), "our-staging-vpc");
        assert_eq!(ws.tag_names(), &["my-prefix"]);
        assert_eq!(
            base.backend_config("staging-vpc")
                .unwrap()
                .workspace_name()
                .as_str(),
            "our-staging-vpc"
        );
    }

    #[test]
    fn namer_cannot_change_after_provisioning() {
        let mut base = base(BaseOptions::default());
        base.provision_workspace(&name("vpc"), &WorkspaceOptions::default())
            .unwrap();
        assert!(matches!(
            base.with_namer(PrefixNamer),
            Err(StackError::NamerLocked)
        ));
    }

    #[test]
    fn invalid_namer_output_rejected() {
        let result = base(BaseOptions::default())
            .with_namer(crate::core::naming::FnNamer::new(|_, s| format!("{s}.ws")));
        assert!(matches!(result, Err(StackError::Type(_))));
    }

    #[test]
    fn provider_config_mirrors_options() {
        let base = base(BaseOptions {
            hostname: Some("tfe.internal".into()),
            ssl_skip_verify: Some(true),
            ..Default::default()
        });
        let provider = base.provider_config();
        assert_eq!(provider.hostname.as_deref(), Some("tfe.internal"));
        assert_eq!(provider.ssl_skip_verify, Some(true));
        assert!(provider.token.is_none());
    }
}
