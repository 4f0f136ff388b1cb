//! Integration tests for the mstack binary.
//!
//! Each test writes a project file into a temporary directory and runs the
//! CLI against it with `--cwd`. Global config lookup is pointed into the
//! same directory so the user's own files never leak in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use multistack::synth::Manifest;

// =============================================================================
// Test Fixtures
// =============================================================================

const PROJECT: &str = r#"
organization = "acme"
prefix = "p"

[default_workspace]
tag_names = ["infra"]

[[stacks]]
name = "vpc"

[[stacks]]
name = "dns"
managed = false

[[stacks]]
name = "cluster"
depends_on = ["vpc", "dns"]

[[stacks.variables]]
name = "DB_PASSWORD"
sensitive = true
"#;

/// A project directory with an isolated environment.
struct TestProject {
    dir: TempDir,
}

impl TestProject {
    fn new(project: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("multistack.toml"), project).unwrap();
        Self { dir }
    }

    fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn mstack(&self) -> Command {
        let mut cmd = Command::cargo_bin("mstack").unwrap();
        cmd.arg("--cwd")
            .arg(self.path())
            .env("MULTISTACK_CONFIG", self.path().join("global.toml"))
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env("HOME", self.path())
            .env_remove("TFE_TOKEN")
            .env_remove("RUST_LOG");
        cmd
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn help_flag_works() {
    Command::cargo_bin("mstack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Terraform Cloud workspaces"));
}

#[test]
fn validate_reports_counts() {
    let project = TestProject::new(PROJECT);
    project
        .mstack()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "OK: 2 managed stack(s), 1 other stack(s), 1 secret(s)",
        ));
}

#[test]
fn quiet_validate_prints_nothing() {
    let project = TestProject::new(PROJECT);
    project
        .mstack()
        .args(["--quiet", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn synth_writes_documents_and_manifest() {
    let project = TestProject::new(PROJECT);
    project
        .mstack()
        .args(["synth", "--out", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synthesized 3 document(s) for 4 stack(s)"));

    let out = project.path().join("out");
    let manifest: Manifest =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();

    let names: Vec<_> = manifest.stacks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["base", "vpc", "dns", "cluster"]);

    let dns = &manifest.stacks[2];
    assert_eq!(dns.role, "other");
    assert!(dns.path.is_none());

    let cluster = &manifest.stacks[3];
    assert_eq!(cluster.dependencies, vec!["vpc", "dns"]);
    assert_eq!(cluster.path.as_deref(), Some("stacks/cluster/cdk.tf.json"));

    let base: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stacks/base/cdk.tf.json")).unwrap())
            .unwrap();
    assert_eq!(
        base["resource"]["tfe_workspace"]["tfe-multi-stack-workspace-vpc"]["remote_state_consumer_ids"],
        serde_json::json!(["${tfe_workspace.tfe-multi-stack-workspace-cluster.id}"])
    );
    assert_eq!(
        base["resource"]["tfe_workspace"]["tfe-multi-stack-workspace-vpc"]["tag_names"],
        serde_json::json!(["p", "infra"])
    );
    assert!(base["resource"]["tfe_variable"]
        .get("tfe-var-cluster-DB_PASSWORD")
        .is_some());

    assert!(!out.join("stacks/dns").exists());
}

#[test]
fn synth_is_deterministic() {
    let project = TestProject::new(PROJECT);
    for out in ["a", "b"] {
        project.mstack().args(["synth", "--out", out]).assert().success();
    }

    let read = |out: &str| fs::read_to_string(project.path().join(out).join("manifest.json")).unwrap();
    assert_eq!(read("a"), read("b"));
}

#[test]
fn graph_shows_deploy_order() {
    let project = TestProject::new(PROJECT);
    project
        .mstack()
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("base (base)"))
        .stdout(predicate::str::contains("  vpc -> p-vpc"))
        .stdout(predicate::str::contains("  dns (unmanaged)"))
        .stdout(predicate::str::contains("  cluster -> p-cluster\n      after vpc\n      after dns"));
}

#[test]
fn graph_json_lists_roles() {
    let project = TestProject::new(PROJECT);
    let output = project.mstack().args(["graph", "--json"]).output().unwrap();
    assert!(output.status.success());

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["role"], "base");
    assert_eq!(entries[3]["name"], "cluster");
    assert_eq!(entries[3]["workspace"], "p-cluster");
}

#[test]
fn env_token_reaches_the_provider() {
    let project = TestProject::new(PROJECT);
    project
        .mstack()
        .env("TFE_TOKEN", "from-env")
        .args(["synth", "--out", "out"])
        .assert()
        .success();

    let base: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(project.path().join("out/stacks/base/cdk.tf.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(base["provider"]["tfe"][0]["token"], "from-env");
}

#[test]
fn missing_project_file_fails() {
    let project = TestProject::empty();
    project
        .mstack()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no multistack.toml found"));
}

#[test]
fn cycle_fails() {
    let project = TestProject::new(
        r#"
organization = "acme"
prefix = "p"

[[stacks]]
name = "a"
depends_on = ["b"]

[[stacks]]
name = "b"
depends_on = ["a"]
"#,
    );
    project
        .mstack()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycle"));
}

#[test]
fn unknown_keys_are_rejected() {
    let project = TestProject::new(
        r#"
organization = "acme"
prefix = "p"
colour = "blue"
"#,
    );
    project
        .mstack()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
