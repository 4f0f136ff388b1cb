//! synth
//!
//! Rendering an [`Assembly`] into Terraform JSON documents.
//!
//! # Documents
//!
//! - The base document holds the organization data source, the provider
//!   block, every workspace and workspace variable, the base backend and
//!   the base-level input parameters.
//! - Each managed stack document holds its backend and its local input
//!   variables. Whatever else a stack deploys is outside this crate.
//! - Generic stacks get no document; they only appear in the manifest.
//!
//! Object keys are sorted, so a document's text (and fingerprint) depends
//! only on the app, not on construction order.
//!
//! # Parameter names
//!
//! Base parameters are keyed by external name. Parameters created for
//! different stacks under the same name share one `variable` block: their
//! configs are merged field by field, later declarations winning.

mod writer;

pub use writer::{write_synthesis, Manifest, ManifestEntry, MANIFEST_FILE};

use std::path::PathBuf;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::types::{Fingerprint, StackName};
use crate::provider::{
    VariableConfig, ORGANIZATION_DATA, ORGANIZATION_LOGICAL_ID, PROVIDER_NAME, PROVIDER_SOURCE,
    PROVIDER_VERSION, VARIABLE_RESOURCE, WORKSPACE_RESOURCE,
};
use crate::stack::{Assembly, Role, Stack, StackError, BASE_ID};

/// Errors from synthesis and writing.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("failed to serialize document for '{stack}': {source}")]
    Serialize {
        stack: String,
        source: serde_json::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Stack(#[from] StackError),
}

/// A rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    contents: Value,
    text: String,
    fingerprint: Fingerprint,
}

impl Document {
    fn render(stack: &str, contents: Value) -> Result<Self, SynthError> {
        let text = serde_json::to_string_pretty(&contents).map_err(|source| {
            SynthError::Serialize {
                stack: stack.to_string(),
                source,
            }
        })?;
        let fingerprint = Fingerprint::compute(text.as_bytes());
        Ok(Self {
            contents,
            text,
            fingerprint,
        })
    }

    /// The document as a JSON value.
    pub fn contents(&self) -> &Value {
        &self.contents
    }

    /// Pretty-printed JSON text, as written to disk.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// SHA-256 of [`text`](Self::text).
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// One entry of the synthesized output, in deploy order.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub role: Role,
    /// Stacks this one deploys after
    pub dependencies: Vec<StackName>,
    /// `None` for generic stacks
    pub document: Option<Document>,
}

/// All artifacts of an assembly: the base first, then stacks in deploy order.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    artifacts: Vec<Artifact>,
}

impl Synthesis {
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Artifact by stack name (`"base"` for the base).
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Document by stack name.
    pub fn document(&self, name: &str) -> Option<&Document> {
        self.artifact(name).and_then(|a| a.document.as_ref())
    }
}

/// Render every document of `assembly`.
pub fn synthesize(assembly: &Assembly) -> Result<Synthesis, SynthError> {
    let mut artifacts = Vec::with_capacity(assembly.deploy_order().len() + 1);

    artifacts.push(Artifact {
        name: BASE_ID.to_string(),
        role: Role::Base,
        dependencies: Vec::new(),
        document: Some(Document::render(BASE_ID, base_document(assembly)?)?),
    });

    for name in assembly.deploy_order() {
        let dependencies = assembly
            .graph()
            .dependencies(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default();

        let (role, document) = match assembly.stack(name.as_str()) {
            Some(stack) => (
                Role::ManagedStack,
                Some(Document::render(name.as_str(), stack_document(stack)?)?),
            ),
            None => (Role::Other, None),
        };

        artifacts.push(Artifact {
            name: name.to_string(),
            role,
            dependencies,
            document,
        });
    }

    debug!(artifacts = artifacts.len(), "synthesized app");
    Ok(Synthesis { artifacts })
}

fn to_value(stack: &str, value: impl serde::Serialize) -> Result<Value, SynthError> {
    serde_json::to_value(value).map_err(|source| SynthError::Serialize {
        stack: stack.to_string(),
        source,
    })
}

/// Merge `later` over `earlier`, field by field.
fn merge_variable(earlier: &VariableConfig, later: &VariableConfig) -> VariableConfig {
    VariableConfig {
        type_constraint: later
            .type_constraint
            .clone()
            .or_else(|| earlier.type_constraint.clone()),
        default: later.default.clone().or_else(|| earlier.default.clone()),
        description: later
            .description
            .clone()
            .or_else(|| earlier.description.clone()),
        sensitive: later.sensitive.or(earlier.sensitive),
        nullable: later.nullable.or(earlier.nullable),
    }
}

fn base_document(assembly: &Assembly) -> Result<Value, SynthError> {
    let base = assembly.base();
    let mut doc = Map::new();

    doc.insert(
        "data".into(),
        json!({
            ORGANIZATION_DATA: {
                ORGANIZATION_LOGICAL_ID: to_value(BASE_ID, base.organization_data())?
            }
        }),
    );

    doc.insert(
        "provider".into(),
        json!({ PROVIDER_NAME: [to_value(BASE_ID, base.provider_config())?] }),
    );

    let mut resource = Map::new();
    let mut workspaces = Map::new();
    for (_, workspace) in base.workspaces() {
        workspaces.insert(
            workspace.logical_id().to_string(),
            to_value(BASE_ID, workspace)?,
        );
    }
    if !workspaces.is_empty() {
        resource.insert(WORKSPACE_RESOURCE.into(), Value::Object(workspaces));
    }

    let mut variables = Map::new();
    for variable in base.variables() {
        variables.insert(variable.logical_id.clone(), to_value(BASE_ID, variable)?);
    }
    if !variables.is_empty() {
        resource.insert(VARIABLE_RESOURCE.into(), Value::Object(variables));
    }
    if !resource.is_empty() {
        doc.insert("resource".into(), Value::Object(resource));
    }

    doc.insert(
        "terraform".into(),
        json!({
            "backend": { "remote": to_value(BASE_ID, base.own_backend()?)? },
            "required_providers": {
                PROVIDER_NAME: { "source": PROVIDER_SOURCE, "version": PROVIDER_VERSION }
            }
        }),
    );

    let mut parameters: indexmap::IndexMap<&str, VariableConfig> = indexmap::IndexMap::new();
    for parameter in base.parameters() {
        let name = parameter.name.as_str();
        let merged = match parameters.get(name) {
            Some(existing) => {
                if *existing != parameter.config {
                    warn!(
                        variable = name,
                        parameter = %parameter.id,
                        "base parameters share a name but differ; later values win"
                    );
                }
                merge_variable(existing, &parameter.config)
            }
            None => parameter.config.clone(),
        };
        parameters.insert(name, merged);
    }
    if !parameters.is_empty() {
        let mut block = Map::new();
        for (name, config) in parameters {
            block.insert(name.to_string(), to_value(BASE_ID, config)?);
        }
        doc.insert("variable".into(), Value::Object(block));
    }

    Ok(Value::Object(doc))
}

fn stack_document(stack: &Stack) -> Result<Value, SynthError> {
    let name = stack.name().as_str();
    let mut doc = Map::new();

    doc.insert(
        "terraform".into(),
        json!({ "backend": { "remote": to_value(name, stack.backend())? } }),
    );

    let mut variables = Map::new();
    for variable in stack.variables() {
        variables.insert(variable.name.to_string(), to_value(name, variable)?);
    }
    if !variables.is_empty() {
        doc.insert("variable".into(), Value::Object(variables));
    }

    Ok(Value::Object(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{App, BaseOptions, BaseUnit};

    fn assembled(build: impl FnOnce(&mut App)) -> Assembly {
        let mut app = App::new();
        app.install_base(BaseUnit::new("my-company", "my-prefix", BaseOptions::default()).unwrap())
            .unwrap();
        build(&mut app);
        app.assemble().unwrap()
    }

    #[test]
    fn empty_base_document() {
        let synthesis = synthesize(&assembled(|_| {})).unwrap();
        let doc = synthesis.document("base").unwrap();

        assert_eq!(
            doc.contents(),
            &json!({
                "data": { "tfe_organization": { "organization": { "name": "my-company" } } },
                "provider": { "tfe": [{}] },
                "terraform": {
                    "backend": { "remote": {
                        "organization": "my-company",
                        "workspaces": { "name": "my-prefix-base" }
                    } },
                    "required_providers": {
                        "tfe": { "source": "hashicorp/tfe", "version": "0.51.1" }
                    }
                }
            })
        );
    }

    #[test]
    fn keys_are_sorted_in_text() {
        let synthesis = synthesize(&assembled(|app| {
            app.add_stack("vpc", None).unwrap();
        }))
        .unwrap();
        let text = synthesis.document("base").unwrap().text();

        let data = text.find("\"data\"").unwrap();
        let provider = text.find("\"provider\"").unwrap();
        let resource = text.find("\"resource\"").unwrap();
        let terraform = text.find("\"terraform\"").unwrap();
        assert!(data < provider && provider < resource && resource < terraform);
    }

    #[test]
    fn generic_stacks_have_no_document() {
        let synthesis = synthesize(&assembled(|app| {
            let dns = app.add_generic_stack("dns").unwrap();
            let vpc = app.add_stack("vpc", None).unwrap();
            app.add_dependency(&vpc, &dns).unwrap();
        }))
        .unwrap();

        let names: Vec<_> = synthesis.artifacts().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["base", "dns", "vpc"]);

        let dns = synthesis.artifact("dns").unwrap();
        assert_eq!(dns.role, Role::Other);
        assert!(dns.document.is_none());

        let vpc = synthesis.artifact("vpc").unwrap();
        assert_eq!(vpc.dependencies, vec![StackName::new("dns").unwrap()]);
    }

    #[test]
    fn shared_parameter_names_merge() {
        let synthesis = synthesize(&assembled(|app| {
            let a = app.add_stack("a", None).unwrap();
            let b = app.add_stack("b", None).unwrap();
            app.create_secret(
                &a,
                "vpc-name",
                VariableConfig {
                    type_constraint: Some("string".into()),
                    default: Some(json!("a-vpc")),
                    ..Default::default()
                },
            )
            .unwrap();
            app.create_secret(
                &b,
                "vpc-name",
                VariableConfig {
                    default: Some(json!("b-vpc")),
                    ..Default::default()
                },
            )
            .unwrap();
        }))
        .unwrap();

        let doc = synthesis.document("base").unwrap().contents();
        assert_eq!(
            doc["variable"],
            json!({ "vpc-name": { "default": "b-vpc", "type": "string" } })
        );
        assert_eq!(doc["resource"]["tfe_variable"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn fingerprint_tracks_text() {
        let synthesis = synthesize(&assembled(|_| {})).unwrap();
        let doc = synthesis.document("base").unwrap();
        assert_eq!(
            doc.fingerprint(),
            &Fingerprint::compute(doc.text().as_bytes())
        );
    }
}
