//! provider
//!
//! Resource descriptions for the Terraform Cloud / Enterprise provider.
//!
//! # Design
//!
//! Nothing in this module talks to a remote API. Each type is a plain
//! description that serializes to the Terraform JSON shape the provider
//! expects; an external apply step turns the synthesized documents into
//! API calls.
//!
//! - [`Workspace`] / [`WorkspaceOptions`] - `tfe_workspace` resource
//! - [`Variable`] - `tfe_variable` resource
//! - [`OrganizationData`] - `tfe_organization` data source
//! - [`ProviderConfig`] - `provider "tfe"` block
//! - [`InputVariable`] / [`VariableConfig`] - Terraform `variable` block
//! - [`RemoteBackendConfig`] - `terraform.backend.remote` block

mod resources;
mod workspace;

pub use resources::{
    BackendWorkspace, InputVariable, OrganizationData, ProviderConfig, RemoteBackendConfig,
    Variable, VariableCategory, VariableConfig, ORGANIZATION_LOGICAL_ID,
};
pub use workspace::{Workspace, WorkspaceOptions};

use thiserror::Error;

/// Provider name used for the `provider` block.
pub const PROVIDER_NAME: &str = "tfe";

/// Registry source of the provider.
pub const PROVIDER_SOURCE: &str = "hashicorp/tfe";

/// Provider version the documents are written against.
pub const PROVIDER_VERSION: &str = "0.51.1";

/// Resource type of workspaces.
pub const WORKSPACE_RESOURCE: &str = "tfe_workspace";

/// Resource type of workspace variables.
pub const VARIABLE_RESOURCE: &str = "tfe_variable";

/// Data source type of organizations.
pub const ORGANIZATION_DATA: &str = "tfe_organization";

/// Errors from resource option validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid workspace option: {0}")]
    InvalidOption(String),
}
