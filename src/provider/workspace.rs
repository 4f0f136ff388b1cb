//! provider::workspace
//!
//! The `tfe_workspace` resource and its options.
//!
//! # Merge Semantics
//!
//! Base-level defaults and per-stack options are merged field by field:
//! a field set on the stack replaces the base default, including list
//! fields. Tags are composed afterwards by [`Workspace::new`], which puts
//! the prefix tag ahead of the merged tag list.

use serde::{Deserialize, Serialize};

use super::{ProviderError, WORKSPACE_RESOURCE};
use crate::core::types::{Expression, StackName, WorkspaceName};

/// Logical id prefix for workspaces provisioned for stacks.
pub const WORKSPACE_ID_PREFIX: &str = "tfe-multi-stack-workspace-";

/// Execution modes accepted by the remote side.
pub const EXECUTION_MODES: &[&str] = &["remote", "local", "agent"];

/// Optional workspace settings.
///
/// Used both as the base-level default template and as per-stack
/// overrides. Every field is optional; unset fields are omitted from the
/// synthesized resource.
///
/// # Example
///
/// ```toml
/// agent_pool_id = "42"
/// queue_all_runs = true
/// tag_names = ["another-tag"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_pool_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_destroy_plan: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// One of `remote`, `local`, `agent`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_triggers_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_remote_state: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_all_runs: Option<bool>,

    /// Extra consumers on top of the ones added by dependency wiring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_state_consumer_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speculative_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_run_output_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_prefixes: Option<Vec<String>>,
}

impl WorkspaceOptions {
    /// Merge per-stack `overrides` over these defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use multistack::provider::WorkspaceOptions;
    ///
    /// let defaults = WorkspaceOptions {
    ///     agent_pool_id: Some("42".into()),
    ///     tag_names: Some(vec!["another-tag".into()]),
    ///     ..Default::default()
    /// };
    /// let overrides = WorkspaceOptions {
    ///     tag_names: Some(vec!["staging-tag".into()]),
    ///     ..Default::default()
    /// };
    ///
    /// let merged = defaults.merged_with(&overrides);
    /// assert_eq!(merged.agent_pool_id.as_deref(), Some("42"));
    /// assert_eq!(merged.tag_names, Some(vec!["staging-tag".to_string()]));
    /// ```
    pub fn merged_with(&self, overrides: &WorkspaceOptions) -> WorkspaceOptions {
        fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }

        WorkspaceOptions {
            agent_pool_id: pick(&overrides.agent_pool_id, &self.agent_pool_id),
            allow_destroy_plan: pick(&overrides.allow_destroy_plan, &self.allow_destroy_plan),
            auto_apply: pick(&overrides.auto_apply, &self.auto_apply),
            description: pick(&overrides.description, &self.description),
            execution_mode: pick(&overrides.execution_mode, &self.execution_mode),
            file_triggers_enabled: pick(
                &overrides.file_triggers_enabled,
                &self.file_triggers_enabled,
            ),
            global_remote_state: pick(&overrides.global_remote_state, &self.global_remote_state),
            queue_all_runs: pick(&overrides.queue_all_runs, &self.queue_all_runs),
            remote_state_consumer_ids: pick(
                &overrides.remote_state_consumer_ids,
                &self.remote_state_consumer_ids,
            ),
            speculative_enabled: pick(&overrides.speculative_enabled, &self.speculative_enabled),
            ssh_key_id: pick(&overrides.ssh_key_id, &self.ssh_key_id),
            structured_run_output_enabled: pick(
                &overrides.structured_run_output_enabled,
                &self.structured_run_output_enabled,
            ),
            tag_names: pick(&overrides.tag_names, &self.tag_names),
            terraform_version: pick(&overrides.terraform_version, &self.terraform_version),
            trigger_prefixes: pick(&overrides.trigger_prefixes, &self.trigger_prefixes),
        }
    }

    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidOption` for an unknown execution
    /// mode or an empty tag.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if let Some(mode) = &self.execution_mode {
            if !EXECUTION_MODES.contains(&mode.as_str()) {
                return Err(ProviderError::InvalidOption(format!(
                    "invalid execution_mode '{}', must be one of: {}",
                    mode,
                    EXECUTION_MODES.join(", ")
                )));
            }
        }

        if let Some(tags) = &self.tag_names {
            if tags.iter().any(|t| t.trim().is_empty()) {
                return Err(ProviderError::InvalidOption(
                    "tag_names cannot contain empty tags".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// A workspace provisioned for one stack.
///
/// Serializes to the body of a `tfe_workspace` resource block. The consumer
/// and predecessor lists only grow, and never hold the same entry twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    #[serde(skip)]
    logical_id: String,

    #[serde(skip)]
    stack: StackName,

    name: WorkspaceName,

    organization: Expression,

    tag_names: Vec<String>,

    remote_state_consumer_ids: Vec<Expression>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<Expression>,

    /// Remaining options; tags and consumers are lifted out above
    #[serde(flatten)]
    options: WorkspaceOptions,
}

impl Workspace {
    /// Describe the workspace for `stack`.
    ///
    /// `options` are the already merged options. The prefix tag goes
    /// first, followed by the merged tags; configured consumer ids seed
    /// the consumer list.
    pub fn new(
        stack: StackName,
        name: WorkspaceName,
        organization: Expression,
        prefix_tag: &str,
        mut options: WorkspaceOptions,
    ) -> Self {
        let mut tag_names = vec![prefix_tag.to_string()];
        tag_names.extend(options.tag_names.take().unwrap_or_default());

        let mut remote_state_consumer_ids: Vec<Expression> = Vec::new();
        for id in options.remote_state_consumer_ids.take().unwrap_or_default() {
            let id = Expression::raw(id);
            if !remote_state_consumer_ids.contains(&id) {
                remote_state_consumer_ids.push(id);
            }
        }

        Self {
            logical_id: format!("{WORKSPACE_ID_PREFIX}{stack}"),
            stack,
            name,
            organization,
            tag_names,
            remote_state_consumer_ids,
            depends_on: Vec::new(),
            options,
        }
    }

    /// Logical id of the resource block.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Stack this workspace belongs to.
    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    /// Remote workspace name.
    pub fn name(&self) -> &WorkspaceName {
        &self.name
    }

    /// Organization reference.
    pub fn organization(&self) -> &Expression {
        &self.organization
    }

    /// Tags, prefix tag first.
    pub fn tag_names(&self) -> &[String] {
        &self.tag_names
    }

    /// Workspaces allowed to read this workspace's state.
    pub fn remote_state_consumer_ids(&self) -> &[Expression] {
        &self.remote_state_consumer_ids
    }

    /// Resources that must be realized before this workspace.
    pub fn depends_on(&self) -> &[Expression] {
        &self.depends_on
    }

    /// Options other than tags and consumers.
    pub fn options(&self) -> &WorkspaceOptions {
        &self.options
    }

    /// Fully-qualified resource name, `tfe_workspace.<logical id>`.
    pub fn fqn(&self) -> String {
        format!("{WORKSPACE_RESOURCE}.{}", self.logical_id)
    }

    /// Reference to the remote workspace id.
    pub fn id(&self) -> Expression {
        Expression::reference(format!("{}.id", self.fqn()))
    }

    /// Reference to the whole resource, used as an ordering hint.
    pub fn locator(&self) -> Expression {
        Expression::reference(self.fqn())
    }

    /// Allow `consumer` to read this workspace's state.
    ///
    /// Returns `false` if it was already allowed.
    pub(crate) fn add_remote_state_consumer(&mut self, consumer: Expression) -> bool {
        if self.remote_state_consumer_ids.contains(&consumer) {
            return false;
        }
        self.remote_state_consumer_ids.push(consumer);
        true
    }

    /// Require `predecessor` to be realized before this workspace.
    ///
    /// Returns `false` if it was already required.
    pub(crate) fn add_predecessor(&mut self, predecessor: Expression) -> bool {
        if self.depends_on.contains(&predecessor) {
            return false;
        }
        self.depends_on.push(predecessor);
        true
    }

    #[cfg(test)]
    pub(crate) fn push_consumer_unchecked(&mut self, consumer: Expression) {
        self.remote_state_consumer_ids.push(consumer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workspace(options: WorkspaceOptions) -> Workspace {
        Workspace::new(
            StackName::new("staging-vpc").unwrap(),
            WorkspaceName::new("my-prefix-staging-vpc").unwrap(),
            Expression::reference("data.tfe_organization.organization.name"),
            "my-prefix",
            options,
        )
    }

    #[test]
    fn merge_override_wins_per_field() {
        let defaults = WorkspaceOptions {
            agent_pool_id: Some("42".into()),
            queue_all_runs: Some(true),
            trigger_prefixes: Some(vec!["modules/".into()]),
            ..Default::default()
        };
        let overrides = WorkspaceOptions {
            queue_all_runs: Some(false),
            trigger_prefixes: Some(vec!["stacks/".into()]),
            execution_mode: Some("remote".into()),
            ..Default::default()
        };

        let merged = defaults.merged_with(&overrides);
        assert_eq!(merged.agent_pool_id.as_deref(), Some("42"));
        assert_eq!(merged.queue_all_runs, Some(false));
        assert_eq!(merged.trigger_prefixes, Some(vec!["stacks/".to_string()]));
        assert_eq!(merged.execution_mode.as_deref(), Some("remote"));
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let defaults = WorkspaceOptions {
            auto_apply: Some(true),
            ..Default::default()
        };
        assert_eq!(defaults.merged_with(&WorkspaceOptions::default()), defaults);
    }

    #[test]
    fn validate_rejects_unknown_execution_mode() {
        let opts = WorkspaceOptions {
            execution_mode: Some("cloud".into()),
            ..Default::default()
        };
        assert!(opts.validate().is_err());

        let opts = WorkspaceOptions {
            execution_mode: Some("agent".into()),
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_tags() {
        let opts = WorkspaceOptions {
            tag_names: Some(vec!["ok".into(), " ".into()]),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn prefix_tag_comes_first() {
        let ws = workspace(WorkspaceOptions {
            tag_names: Some(vec!["staging-tag".into()]),
            ..Default::default()
        });
        assert_eq!(ws.tag_names(), &["my-prefix", "staging-tag"]);
    }

    #[test]
    fn references() {
        let ws = workspace(WorkspaceOptions::default());
        assert_eq!(ws.logical_id(), "tfe-multi-stack-workspace-staging-vpc");
        assert_eq!(ws.fqn(), "tfe_workspace.tfe-multi-stack-workspace-staging-vpc");
        assert_eq!(
            ws.id().as_str(),
            "${tfe_workspace.tfe-multi-stack-workspace-staging-vpc.id}"
        );
        assert_eq!(
            ws.locator().as_str(),
            "${tfe_workspace.tfe-multi-stack-workspace-staging-vpc}"
        );
    }

    #[test]
    fn consumer_and_predecessor_lists_deduplicate() {
        let mut ws = workspace(WorkspaceOptions::default());
        let consumer = Expression::reference("tfe_workspace.other.id");
        let locator = Expression::reference("tfe_workspace.other");

        assert!(ws.add_remote_state_consumer(consumer.clone()));
        assert!(!ws.add_remote_state_consumer(consumer));
        assert!(ws.add_predecessor(locator.clone()));
        assert!(!ws.add_predecessor(locator));

        assert_eq!(ws.remote_state_consumer_ids().len(), 1);
        assert_eq!(ws.depends_on().len(), 1);
    }

    #[test]
    fn configured_consumers_seed_the_list() {
        let ws = workspace(WorkspaceOptions {
            remote_state_consumer_ids: Some(vec!["ws-abc".into(), "ws-abc".into()]),
            ..Default::default()
        });
        assert_eq!(ws.remote_state_consumer_ids(), &[Expression::raw("ws-abc")]);
        assert!(ws.options().remote_state_consumer_ids.is_none());
    }

    #[test]
    fn serializes_to_resource_block() {
        let ws = workspace(WorkspaceOptions {
            agent_pool_id: Some("42".into()),
            queue_all_runs: Some(true),
            ..Default::default()
        });

        assert_eq!(
            serde_json::to_value(&ws).unwrap(),
            json!({
                "agent_pool_id": "42",
                "name": "my-prefix-staging-vpc",
                "organization": "${data.tfe_organization.organization.name}",
                "queue_all_runs": true,
                "remote_state_consumer_ids": [],
                "tag_names": ["my-prefix"]
            })
        );
    }

    #[test]
    fn depends_on_serialized_only_when_present() {
        let mut ws = workspace(WorkspaceOptions::default());
        ws.add_predecessor(Expression::reference("tfe_workspace.other"));

        let value = serde_json::to_value(&ws).unwrap();
        assert_eq!(value["depends_on"], json!(["${tfe_workspace.other}"]));
    }

    #[test]
    fn options_parse_from_toml() {
        let opts: WorkspaceOptions = toml::from_str(
            r#"
            execution_mode = "remote"
            tag_names = ["a", "b"]
            "#,
        )
        .unwrap();
        assert_eq!(opts.execution_mode.as_deref(), Some("remote"));
        assert_eq!(opts.tag_names, Some(vec!["a".to_string(), "b".to_string()]));

        let unknown: Result<WorkspaceOptions, _> = toml::from_str("nope = 1");
        assert!(unknown.is_err());
    }
}
