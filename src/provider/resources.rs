//! provider::resources
//!
//! Provider, organization, variable and backend descriptions.
//!
//! # Security
//!
//! Tokens end up in the synthesized documents because the backend and
//! provider blocks need them, but `Debug` output redacts them so they
//! never reach logs.

use serde::{Deserialize, Serialize};

use super::{ORGANIZATION_DATA, VARIABLE_RESOURCE};
use crate::core::types::{Expression, OrganizationName, VariableName, WorkspaceName};

/// Logical id of the organization data source in the base.
pub const ORGANIZATION_LOGICAL_ID: &str = "organization";

const REDACTED: &str = "<redacted>";

fn redact(token: &Option<String>) -> Option<&'static str> {
    token.as_ref().map(|_| REDACTED)
}

/// The `provider "tfe"` block.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_skip_verify: Option<bool>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("hostname", &self.hostname)
            .field("token", &redact(&self.token))
            .field("ssl_skip_verify", &self.ssl_skip_verify)
            .finish()
    }
}

/// Read-only lookup of the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationData {
    pub name: OrganizationName,
}

impl OrganizationData {
    /// Describe the organization lookup.
    pub fn new(name: OrganizationName) -> Self {
        Self { name }
    }

    /// Reference to the organization name as resolved by the provider.
    pub fn name_ref(&self) -> Expression {
        Expression::reference(format!(
            "data.{ORGANIZATION_DATA}.{ORGANIZATION_LOGICAL_ID}.name"
        ))
    }
}

/// Workspace selector inside a remote backend block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendWorkspace {
    pub name: WorkspaceName,
}

/// The `terraform.backend.remote` block of one stack.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RemoteBackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    pub organization: OrganizationName,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub workspaces: BackendWorkspace,
}

impl RemoteBackendConfig {
    /// Name of the workspace this backend points at.
    pub fn workspace_name(&self) -> &WorkspaceName {
        &self.workspaces.name
    }
}

impl std::fmt::Debug for RemoteBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackendConfig")
            .field("hostname", &self.hostname)
            .field("organization", &self.organization)
            .field("token", &redact(&self.token))
            .field("workspaces", &self.workspaces)
            .finish()
    }
}

/// Configuration of a Terraform input variable.
///
/// # Example
///
/// ```toml
/// type = "string"
/// default = "staging-vpc"
/// sensitive = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariableConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_constraint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl VariableConfig {
    /// A sensitive variable without default.
    pub fn sensitive() -> Self {
        Self {
            sensitive: Some(true),
            ..Default::default()
        }
    }
}

/// A Terraform `variable` block.
///
/// `id` identifies the variable inside its stack; `name` is the external
/// name it is declared under in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputVariable {
    #[serde(skip)]
    pub id: String,

    #[serde(skip)]
    pub name: VariableName,

    #[serde(flatten)]
    pub config: VariableConfig,
}

impl InputVariable {
    /// Reference to the variable's value.
    pub fn value_ref(&self) -> Expression {
        Expression::reference(format!("var.{}", self.name))
    }
}

/// Category of a workspace variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableCategory {
    /// Terraform input variable
    Terraform,
    /// Environment variable
    Env,
}

/// A `tfe_variable` resource bound to one workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    #[serde(skip)]
    pub logical_id: String,

    /// Id of the base-level input variable `value` refers to
    #[serde(skip)]
    pub source: String,

    pub key: VariableName,

    pub value: Expression,

    pub category: VariableCategory,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub hcl: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,

    pub workspace_id: Expression,
}

impl Variable {
    /// Fully-qualified resource name, `tfe_variable.<logical id>`.
    pub fn fqn(&self) -> String {
        format!("{VARIABLE_RESOURCE}.{}", self.logical_id)
    }
}
