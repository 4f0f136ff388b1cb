//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$MULTISTACK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/multistack/config.toml`
//! 3. `~/.multistack/config.toml`
//!
//! # Project Config
//!
//! Located at `multistack.toml` in the project directory.
//!
//! # Validation
//!
//! Config values are validated after parsing: names must be usable as
//! stack, organization and variable names, and every dependency must name a
//! declared stack.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::naming::TemplateNamer;
use crate::core::types::{OrganizationName, StackName, VariableName};
use crate::provider::{VariableConfig, WorkspaceOptions};
use crate::stack::BASE_ID;

/// Connection to the remote service.
///
/// # Example
///
/// ```toml
/// hostname = "app.terraform.io"
/// ssl_skip_verify = false
/// ```
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Remote hostname
    pub hostname: Option<String>,

    /// API token; prefer the `TFE_TOKEN` environment variable
    pub token: Option<String>,

    /// Skip TLS verification
    pub ssl_skip_verify: Option<bool>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hostname", &self.hostname)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ssl_skip_verify", &self.ssl_skip_verify)
            .finish()
    }
}

impl ConnectionConfig {
    /// Validate the connection values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hostname) = &self.hostname {
            if hostname.trim().is_empty() || hostname.contains("://") {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid hostname '{}', expected a bare host name",
                    hostname
                )));
            }
        }
        if let Some(token) = &self.token {
            if token.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "token cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [connection]
/// hostname = "tfe.example.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Connection defaults
    pub connection: Option<ConnectionConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(connection) = &self.connection {
            connection.validate()?;
        }
        Ok(())
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// organization = "my-company"
/// prefix = "my-prefix"
///
/// [default_workspace]
/// tag_names = ["infra"]
///
/// [[stacks]]
/// name = "vpc"
///
/// [[stacks]]
/// name = "cluster"
/// depends_on = ["vpc"]
///
/// [[stacks.variables]]
/// name = "DB_PASSWORD"
/// sensitive = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Organization owning every workspace
    pub organization: Option<String>,

    /// Prefix used in workspace names and as the first tag
    pub prefix: Option<String>,

    /// Workspace name template, e.g. `"{prefix}-{stack}"`
    pub workspace_name_template: Option<String>,

    /// Connection overrides
    pub connection: Option<ConnectionConfig>,

    /// Options merged into every workspace
    pub default_workspace: Option<WorkspaceOptions>,

    /// Stacks in creation order
    pub stacks: Vec<StackConfig>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` for a missing organization or
    /// prefix, and `ConfigError::InvalidValue` for anything malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let organization = self
            .organization
            .as_deref()
            .ok_or(ConfigError::MissingField("organization"))?;
        OrganizationName::new(organization)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid organization: {}", e)))?;

        let prefix = self
            .prefix
            .as_deref()
            .ok_or(ConfigError::MissingField("prefix"))?;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidValue(format!(
                "invalid prefix '{}': only letters, digits, '-' and '_' are allowed",
                prefix
            )));
        }

        if let Some(template) = &self.workspace_name_template {
            TemplateNamer::new(template.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid workspace_name_template: {}", e))
            })?;
        }

        if let Some(connection) = &self.connection {
            connection.validate()?;
        }

        if let Some(defaults) = &self.default_workspace {
            defaults
                .validate()
                .map_err(|e| ConfigError::InvalidValue(format!("default_workspace: {}", e)))?;
        }

        let mut seen = HashSet::new();
        for stack in &self.stacks {
            stack.validate()?;
            if !seen.insert(stack.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "stack '{}' is declared more than once",
                    stack.name
                )));
            }
        }

        for stack in &self.stacks {
            for dependency in &stack.depends_on {
                if !seen.contains(dependency.as_str()) {
                    return Err(ConfigError::InvalidValue(format!(
                        "stack '{}' depends on undeclared stack '{}'",
                        stack.name, dependency
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_managed() -> bool {
    true
}

/// One stack of the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Stack name
    pub name: String,

    /// Whether the base manages a workspace for this stack (default: true)
    #[serde(default = "default_managed")]
    pub managed: bool,

    /// Workspace options, merged over `default_workspace`
    #[serde(default)]
    pub workspace: Option<WorkspaceOptions>,

    /// Stacks that deploy before this one
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Input variables supplied by the base
    #[serde(default)]
    pub variables: Vec<VariableDeclaration>,
}

impl StackConfig {
    /// Validate a single stack entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        StackName::new(self.name.as_str())
            .map_err(|e| ConfigError::InvalidValue(format!("invalid stack name: {}", e)))?;

        if self.name == BASE_ID {
            return Err(ConfigError::InvalidValue(format!(
                "stack name '{}' is reserved for the base stack",
                BASE_ID
            )));
        }

        if self.depends_on.iter().any(|d| *d == self.name) {
            return Err(ConfigError::InvalidValue(format!(
                "stack '{}' cannot depend on itself",
                self.name
            )));
        }

        if !self.managed {
            if self.workspace.is_some() {
                return Err(ConfigError::InvalidValue(format!(
                    "stack '{}' is not managed and cannot have workspace options",
                    self.name
                )));
            }
            if !self.variables.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "stack '{}' is not managed and cannot have variables",
                    self.name
                )));
            }
        }

        if let Some(workspace) = &self.workspace {
            workspace.validate().map_err(|e| {
                ConfigError::InvalidValue(format!("stack '{}': {}", self.name, e))
            })?;
        }

        let mut names = HashSet::new();
        for variable in &self.variables {
            VariableName::new(variable.name.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("stack '{}': {}", self.name, e))
            })?;
            if !names.insert(variable.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "variable '{}' is declared more than once for stack '{}'",
                    variable.name, self.name
                )));
            }
        }

        Ok(())
    }
}

/// A stack variable whose value the base supplies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VariableDeclaration {
    /// Variable name inside the stack and in the base
    pub name: String,

    /// Type constraint, e.g. `"string"`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_constraint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl VariableDeclaration {
    /// The variable block configuration.
    pub fn config(&self) -> VariableConfig {
        VariableConfig {
            type_constraint: self.type_constraint.clone(),
            default: self.default.clone(),
            description: self.description.clone(),
            sensitive: self.sensitive,
            nullable: self.nullable,
        }
    }
}
