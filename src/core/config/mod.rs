//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! multistack has two configuration scopes:
//! - **Global**: User-level connection defaults
//! - **Project**: The app itself: organization, prefix, stacks
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. `TFE_TOKEN` environment variable (token only)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$MULTISTACK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/multistack/config.toml`
//! 3. `~/.multistack/config.toml`
//!
//! # Project Config Locations
//!
//! An explicit path wins. Otherwise, in the project directory:
//! 1. `multistack.toml` (canonical)
//! 2. `.multistack/config.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use multistack::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(None, Path::new("/path/to/project")).unwrap();
//! let config = result.config;
//!
//! println!("Organization: {}", config.organization().unwrap());
//! println!("Stacks: {}", config.stacks().len());
//! ```

pub mod schema;

pub use schema::{ConnectionConfig, GlobalConfig, ProjectConfig, StackConfig, VariableDeclaration};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Canonical project file name.
pub const PROJECT_FILE: &str = "multistack.toml";

/// Environment variable overriding the API token.
pub const TOKEN_ENV: &str = "TFE_TOKEN";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required config field '{0}'")]
    MissingField(&'static str),

    #[error("no multistack.toml found in '{0}'")]
    NotFound(PathBuf),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Project config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration
    pub project: ProjectConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file
    project_path: Option<PathBuf>,
    /// Token from the environment, captured at load time
    env_token: Option<String>,
}

impl Config {
    /// Load configuration.
    ///
    /// `project_file` is used as-is when given; otherwise the project file
    /// is searched in `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if no project file is found, or if a config file
    /// cannot be read, parsed or validated. A missing global config is not
    /// an error (defaults are used).
    pub fn load(
        project_file: Option<&Path>,
        project_dir: &Path,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;

        let project_path = match project_file {
            Some(path) => path.to_path_buf(),
            None => Self::find_project(project_dir, &mut warnings)?,
        };
        let project: ProjectConfig = Self::read_toml(&project_path)?;

        global.validate()?;
        project.validate()?;

        debug!(
            project = %project_path.display(),
            global = ?global_path,
            "loaded configuration"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path: Some(project_path),
                env_token: std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()),
            },
            warnings,
        })
    }

    /// Build a config from already parsed parts.
    ///
    /// The environment is not consulted.
    pub fn from_parts(global: GlobalConfig, project: ProjectConfig) -> Result<Self, ConfigError> {
        global.validate()?;
        project.validate()?;
        Ok(Self {
            global,
            project,
            ..Default::default()
        })
    }

    /// Override the token as if `TFE_TOKEN` were set.
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        self.env_token = token;
        self
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $MULTISTACK_CONFIG
        if let Ok(path) = std::env::var("MULTISTACK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/multistack/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("multistack/config.toml");
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.multistack/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".multistack/config.toml");
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Locate the project file in `dir`.
    fn find_project(dir: &Path, warnings: &mut Vec<ConfigWarning>) -> Result<PathBuf, ConfigError> {
        let canonical = dir.join(PROJECT_FILE);
        if canonical.exists() {
            return Ok(canonical);
        }

        let compat = dir.join(".multistack/config.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            return Ok(compat);
        }

        Err(ConfigError::NotFound(dir.to_path_buf()))
    }

    /// Read and parse a TOML config file.
    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn connection<T>(&self, field: impl Fn(&ConnectionConfig) -> Option<T>) -> Option<T> {
        self.project
            .connection
            .as_ref()
            .and_then(&field)
            .or_else(|| self.global.connection.as_ref().and_then(&field))
    }

    /// Get the organization name.
    pub fn organization(&self) -> Result<&str, ConfigError> {
        self.project
            .organization
            .as_deref()
            .ok_or(ConfigError::MissingField("organization"))
    }

    /// Get the name prefix.
    pub fn prefix(&self) -> Result<&str, ConfigError> {
        self.project
            .prefix
            .as_deref()
            .ok_or(ConfigError::MissingField("prefix"))
    }

    /// Get the workspace name template, if any.
    pub fn workspace_name_template(&self) -> Option<&str> {
        self.project.workspace_name_template.as_deref()
    }

    /// Get the remote hostname.
    pub fn hostname(&self) -> Option<String> {
        self.connection(|c| c.hostname.clone())
    }

    /// Get the API token.
    ///
    /// `TFE_TOKEN` wins over both config files.
    pub fn token(&self) -> Option<String> {
        self.env_token
            .clone()
            .or_else(|| self.connection(|c| c.token.clone()))
    }

    /// Get the TLS verification override.
    pub fn ssl_skip_verify(&self) -> Option<bool> {
        self.connection(|c| c.ssl_skip_verify)
    }

    /// Stacks in declaration order.
    pub fn stacks(&self) -> &[StackConfig] {
        &self.project.stacks
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
        organization = "acme"
        prefix = "p"
    "#;

    #[test]
    fn load_from_project_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_FILE), MINIMAL).unwrap();

        let result = Config::load(None, temp.path()).unwrap();
        let config = result.config;

        assert_eq!(config.organization().unwrap(), "acme");
        assert_eq!(config.prefix().unwrap(), "p");
        assert!(config.stacks().is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(
            config.project_config_loaded_from(),
            Some(temp.path().join(PROJECT_FILE).as_path())
        );
    }

    #[test]
    fn load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, MINIMAL).unwrap();

        let result = Config::load(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(result.config.organization().unwrap(), "acme");
    }

    #[test]
    fn load_compat_warns() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".multistack")).unwrap();
        fs::write(temp.path().join(".multistack/config.toml"), MINIMAL).unwrap();

        let result = Config::load(None, temp.path()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("deprecated"));
    }

    #[test]
    fn missing_project_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(None, temp.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn invalid_project_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_FILE), "organization = \"acme\"").unwrap();
        assert!(matches!(
            Config::load(None, temp.path()),
            Err(ConfigError::MissingField("prefix"))
        ));
    }

    #[test]
    fn unparseable_project_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_FILE), "organization = ").unwrap();
        assert!(matches!(
            Config::load(None, temp.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn precedence_project_overrides_global() {
        let global = GlobalConfig {
            connection: Some(ConnectionConfig {
                hostname: Some("global.example.com".to_string()),
                token: Some("global-token".to_string()),
                ssl_skip_verify: Some(true),
            }),
        };
        let project = ProjectConfig {
            organization: Some("acme".to_string()),
            prefix: Some("p".to_string()),
            connection: Some(ConnectionConfig {
                hostname: Some("project.example.com".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = Config::from_parts(global, project).unwrap();
        assert_eq!(config.hostname().as_deref(), Some("project.example.com"));
        // not set in the project, falls through to global
        assert_eq!(config.token().as_deref(), Some("global-token"));
        assert_eq!(config.ssl_skip_verify(), Some(true));
    }

    #[test]
    fn env_token_wins() {
        let project = ProjectConfig {
            organization: Some("acme".to_string()),
            prefix: Some("p".to_string()),
            connection: Some(ConnectionConfig {
                token: Some("project-token".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = Config::from_parts(GlobalConfig::default(), project)
            .unwrap()
            .with_env_token(Some("env-token".to_string()));
        assert_eq!(config.token().as_deref(), Some("env-token"));
    }
}
