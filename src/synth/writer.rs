//! synth::writer
//!
//! Writing a [`Synthesis`] to disk.
//!
//! # Layout
//!
//! ```text
//! <out>/
//!   manifest.json
//!   stacks/
//!     base/cdk.tf.json
//!     <stack>/cdk.tf.json
//! ```
//!
//! Every file is written to a temporary sibling, synced, then renamed into
//! place, so a reader never sees a half-written document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Synthesis, SynthError};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Document file name inside each stack directory.
pub const DOCUMENT_FILE: &str = "cdk.tf.json";

const MANIFEST_VERSION: u32 = 1;

/// Index of the written documents, in deploy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub stacks: Vec<ManifestEntry>,
}

/// One stack in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// `base`, `managed` or `other`
    pub role: String,
    /// Document path relative to the output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub dependencies: Vec<String>,
    /// SHA-256 of the document text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Write every document and the manifest under `out_dir`.
///
/// # Errors
///
/// Returns [`SynthError::Io`] naming the path that could not be written.
pub fn write_synthesis(synthesis: &Synthesis, out_dir: &Path) -> Result<Manifest, SynthError> {
    let mut stacks = Vec::with_capacity(synthesis.artifacts().len());

    for artifact in synthesis.artifacts() {
        let (path, fingerprint) = match &artifact.document {
            Some(document) => {
                let relative = format!("stacks/{}/{}", artifact.name, DOCUMENT_FILE);
                write_atomic(&out_dir.join(&relative), document.text().as_bytes())?;
                (Some(relative), Some(document.fingerprint().to_string()))
            }
            None => (None, None),
        };

        stacks.push(ManifestEntry {
            name: artifact.name.clone(),
            role: artifact.role.as_str().to_string(),
            path,
            dependencies: artifact
                .dependencies
                .iter()
                .map(ToString::to_string)
                .collect(),
            fingerprint,
        });
    }

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        stacks,
    };
    let contents = serde_json::to_string_pretty(&manifest).map_err(|source| {
        SynthError::Serialize {
            stack: MANIFEST_FILE.to_string(),
            source,
        }
    })?;
    write_atomic(&out_dir.join(MANIFEST_FILE), contents.as_bytes())?;

    debug!(
        out = %out_dir.display(),
        stacks = manifest.stacks.len(),
        "wrote synthesis"
    );
    Ok(manifest)
}

/// Write a file atomically.
///
/// The temporary file is removed again if any step after creating it fails.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SynthError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(path))?;
    }

    // Write to temp file in same directory (for atomic rename)
    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).map_err(io_error(&temp_path))?;

    let result = file
        .write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(io_error(&temp_path))
        .and_then(|()| fs::rename(&temp_path, path).map_err(io_error(path)));

    if result.is_err() {
        drop(file);
        if let Err(err) = fs::remove_file(&temp_path) {
            debug!(path = %temp_path.display(), %err, "could not remove temp file");
        }
    }
    result
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SynthError {
    let path: PathBuf = path.to_path_buf();
    move |source| SynthError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VariableConfig;
    use crate::stack::{App, BaseOptions, BaseUnit};
    use crate::synth::synthesize;
    use tempfile::TempDir;

    fn synthesis() -> Synthesis {
        let mut app = App::new();
        app.install_base(BaseUnit::new("acme", "p", BaseOptions::default()).unwrap())
            .unwrap();
        let vpc = app.add_stack("vpc", None).unwrap();
        let cluster = app.add_stack("cluster", None).unwrap();
        let dns = app.add_generic_stack("dns").unwrap();
        app.add_dependency(&cluster, &vpc).unwrap();
        app.add_dependency(&dns, &cluster).unwrap();
        app.create_secret(&cluster, "DB_PASSWORD", VariableConfig::sensitive())
            .unwrap();
        synthesize(&app.assemble().unwrap()).unwrap()
    }

    #[test]
    fn writes_documents_and_manifest() {
        let temp = TempDir::new().unwrap();
        let synthesis = synthesis();

        let manifest = write_synthesis(&synthesis, temp.path()).unwrap();

        let names: Vec<_> = manifest.stacks.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["base", "vpc", "cluster", "dns"]);

        for entry in &manifest.stacks {
            match &entry.path {
                Some(path) => {
                    let written = fs::read_to_string(temp.path().join(path)).unwrap();
                    assert_eq!(
                        Some(written.as_str()),
                        synthesis.document(&entry.name).map(|d| d.text())
                    );
                }
                None => assert_eq!(entry.role, "other"),
            }
        }

        let on_disk: Manifest =
            serde_json::from_str(&fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(on_disk, manifest);
        assert_eq!(on_disk.stacks[2].dependencies, vec!["vpc"]);
        assert_eq!(on_disk.stacks[3].dependencies, vec!["cluster"]);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        write_synthesis(&synthesis(), temp.path()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("stacks/base"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_write_removes_temp_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join(MANIFEST_FILE);
        // a non-empty directory in the way makes the final rename fail
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = write_atomic(&target, b"{}").unwrap_err();
        match err {
            SynthError::Io { path, .. } => assert_eq!(path, target),
            other => panic!("unexpected error: {other}"),
        }

        assert!(!temp.path().join("manifest.json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn rewriting_is_stable() {
        let temp = TempDir::new().unwrap();
        let first = write_synthesis(&synthesis(), temp.path()).unwrap();
        let second = write_synthesis(&synthesis(), temp.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unwritable_target_reports_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("out");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_synthesis(&synthesis(), &blocker).unwrap_err();
        assert!(matches!(err, SynthError::Io { .. }));
    }
}
