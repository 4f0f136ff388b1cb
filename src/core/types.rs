//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`StackName`] - Validated stack identifier
//! - [`OrganizationName`] - Remote organization (tenant) name
//! - [`WorkspaceName`] - Remote workspace name produced by a namer
//! - [`VariableName`] - Terraform input variable identifier
//! - [`ConstructPath`] - Slash-separated path of a construct in the app
//! - [`Expression`] - Unresolved Terraform reference such as `${var.x}`
//! - [`Fingerprint`] - Content hash of a synthesized document
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use multistack::core::types::{StackName, VariableName, Expression};
//!
//! // Valid constructions
//! let stack = StackName::new("staging-vpc").unwrap();
//! let var = VariableName::new("DB_PASSWORD").unwrap();
//! let expr = Expression::reference(format!("var.{}", var));
//! assert_eq!(expr.as_str(), "${var.DB_PASSWORD}");
//!
//! // Invalid constructions fail at creation time
//! assert!(StackName::new("has/slash").is_err());
//! assert!(VariableName::new("1starts-with-digit").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid stack name: {0}")]
    InvalidStackName(String),

    #[error("invalid organization name: {0}")]
    InvalidOrganizationName(String),

    #[error("invalid workspace name: {0}")]
    InvalidWorkspaceName(String),

    #[error("invalid variable name: {0}")]
    InvalidVariableName(String),

    #[error("invalid construct path: {0}")]
    InvalidConstructPath(String),
}

/// Characters allowed in identifiers that end up inside resource names.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// A validated stack identifier.
///
/// Stack names become part of resource logical ids and construct paths:
/// - Cannot be empty
/// - Only ASCII letters, digits, `-` and `_`
/// - Cannot start with `-`
///
/// # Example
///
/// ```
/// use multistack::core::types::StackName;
///
/// let name = StackName::new("production-vpc").unwrap();
/// assert_eq!(name.as_str(), "production-vpc");
///
/// assert!(StackName::new("").is_err());
/// assert!(StackName::new("-leading").is_err());
/// assert!(StackName::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    /// Create a new validated stack name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidStackName` if the name contains characters
    /// that cannot appear in a resource logical id.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidStackName(
                "stack name cannot be empty".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidStackName(format!(
                "stack name '{name}' cannot start with '-'"
            )));
        }
        if let Some(c) = name.chars().find(|c| !is_ident_char(*c)) {
            return Err(TypeError::InvalidStackName(format!(
                "stack name '{name}' cannot contain '{c}'"
            )));
        }
        Ok(())
    }

    /// Get the stack name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StackName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for StackName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<StackName> for String {
    fn from(name: StackName) -> Self {
        name.0
    }
}

impl AsRef<str> for StackName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StackName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote organization name.
///
/// Organization names are non-empty and limited to letters, digits,
/// `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationName(String);

impl OrganizationName {
    /// Create a new validated organization name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidOrganizationName(
                "organization name cannot be empty".into(),
            ));
        }
        if let Some(c) = name.chars().find(|c| !is_ident_char(*c)) {
            return Err(TypeError::InvalidOrganizationName(format!(
                "organization name '{name}' cannot contain '{c}'"
            )));
        }
        Ok(Self(name))
    }

    /// Get the organization name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrganizationName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<OrganizationName> for String {
    fn from(name: OrganizationName) -> Self {
        name.0
    }
}

impl std::fmt::Display for OrganizationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote workspace name.
///
/// The remote side accepts letters, digits, `-` and `_`, up to
/// [`WorkspaceName::MAX_LEN`] characters. Names are produced by a
/// [`WorkspaceNamer`](crate::core::naming::WorkspaceNamer), so an invalid
/// name here usually means a misconfigured naming template.
///
/// # Example
///
/// ```
/// use multistack::core::types::WorkspaceName;
///
/// assert!(WorkspaceName::new("my-prefix-staging-vpc").is_ok());
/// assert!(WorkspaceName::new("has space").is_err());
/// assert!(WorkspaceName::new("x".repeat(91)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceName(String);

impl WorkspaceName {
    /// Longest workspace name the remote API accepts.
    pub const MAX_LEN: usize = 90;

    /// Create a new validated workspace name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidWorkspaceName(
                "workspace name cannot be empty".into(),
            ));
        }
        if name.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidWorkspaceName(format!(
                "workspace name '{name}' is longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| !is_ident_char(*c)) {
            return Err(TypeError::InvalidWorkspaceName(format!(
                "workspace name '{name}' cannot contain '{c}'"
            )));
        }
        Ok(Self(name))
    }

    /// Get the workspace name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkspaceName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<WorkspaceName> for String {
    fn from(name: WorkspaceName) -> Self {
        name.0
    }
}

impl std::fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Terraform input variable identifier.
///
/// Must start with a letter or `_` and contain only letters, digits,
/// `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariableName(String);

impl VariableName {
    /// Create a new validated variable name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match name.chars().next() {
            None => {
                return Err(TypeError::InvalidVariableName(
                    "variable name cannot be empty".into(),
                ))
            }
            Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
                return Err(TypeError::InvalidVariableName(format!(
                    "variable name '{name}' must start with a letter or '_'"
                )))
            }
            _ => {}
        }
        if let Some(c) = name.chars().find(|c| !is_ident_char(*c)) {
            return Err(TypeError::InvalidVariableName(format!(
                "variable name '{name}' cannot contain '{c}'"
            )));
        }
        Ok(Self(name))
    }

    /// Get the variable name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VariableName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for VariableName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<VariableName> for String {
    fn from(name: VariableName) -> Self {
        name.0
    }
}

impl std::fmt::Display for VariableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path of a construct inside an application.
///
/// Paths are `/`-separated construct ids relative to the app root, e.g.
/// `staging-vpc` for a stack or `staging-vpc/vpc-name` for a construct
/// declared inside it. The app root itself has the empty path.
///
/// # Example
///
/// ```
/// use multistack::core::types::ConstructPath;
///
/// let path = ConstructPath::new("staging-vpc/vpc-name").unwrap();
/// assert_eq!(path.top_level(), Some("staging-vpc"));
/// assert_eq!(path.parent().unwrap().as_str(), "staging-vpc");
/// assert!(ConstructPath::new("a//b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConstructPath(String);

impl ConstructPath {
    /// Parse a construct path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        if path.is_empty() {
            return Ok(Self::root());
        }
        if path.split('/').any(str::is_empty) {
            return Err(TypeError::InvalidConstructPath(format!(
                "path '{path}' has an empty component"
            )));
        }
        Ok(Self(path))
    }

    /// The app root path.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this is the app root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a child id.
    pub fn child(&self, id: &str) -> Self {
        if self.is_root() {
            Self(id.to_string())
        } else {
            Self(format!("{}/{}", self.0, id))
        }
    }

    /// The enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// The id of the app child this path lives under.
    pub fn top_level(&self) -> Option<&str> {
        self.0.split('/').next().filter(|s| !s.is_empty())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConstructPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ConstructPath> for String {
    fn from(path: ConstructPath) -> Self {
        path.0
    }
}

impl From<&StackName> for ConstructPath {
    fn from(name: &StackName) -> Self {
        Self::root().child(name.as_str())
    }
}

impl std::fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "<app>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// An unresolved Terraform expression.
///
/// Values that only exist once the remote side has created a resource
/// (workspace ids, variable values) are carried as references rather
/// than literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    /// Wrap a reference target as `${target}`.
    pub fn reference(target: impl AsRef<str>) -> Self {
        Self(format!("${{{}}}", target.as_ref()))
    }

    /// Use a raw string verbatim (already an expression or a literal).
    pub fn raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Whether this expression is a single `${...}` reference.
    pub fn is_reference(&self) -> bool {
        self.0.starts_with("${") && self.0.ends_with('}')
    }

    /// Get the expression as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content fingerprint for a synthesized document.
///
/// A SHA-256 hex digest. Two identical documents always share a
/// fingerprint, which lets a later apply step skip unchanged stacks.
///
/// # Example
///
/// ```
/// use multistack::core::types::Fingerprint;
///
/// let fp = Fingerprint::compute(b"{}");
/// assert_eq!(fp, Fingerprint::compute(b"{}"));
/// assert_eq!(fp.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from raw document bytes.
    pub fn compute(contents: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
