//! CLI integration tests for Flotilla.
//!
//! These tests drive the full conversion pipeline over a small module tree,
//! with a stub analyzer script standing in for the external module-graph
//! tool.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the flotilla binary command.
fn flotilla() -> Command {
    Command::cargo_bin("flotilla").unwrap()
}

/// Create a temporary directory for test trees.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&read(path)).unwrap()
}

/// Install a stub analyzer that prints a fixed module graph.
fn install_analyzer(dir: &Path, output: &str) -> PathBuf {
    let script_path = dir.join("analyzer.sh");
    let script = format!("#!/bin/sh\ncat <<'GRAPH'\n{}\nGRAPH\n", output);
    fs::write(&script_path, script).unwrap();
    let mut perms = fs::metadata(&script_path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script_path, perms).unwrap();
    script_path
}

/// Module graph for the standard fixture tree: `b` imports from `a`.
fn fixture_graph(root: &Path) -> String {
    let url = |rel: &str| format!("file://{}/{}", root.display(), rel);
    format!(
        concat!(
            "{{\n",
            "  \"modules\": [\n",
            "    {{ \"specifier\": \"{a_mod}\",\n",
            "      \"dependencies\": [{{ \"code\": {{ \"specifier\": \"{a_core}\" }} }}] }},\n",
            "    {{ \"specifier\": \"{a_core}\", \"dependencies\": [] }},\n",
            "    {{ \"specifier\": \"{b_mod}\",\n",
            "      \"dependencies\": [{{ \"code\": {{ \"specifier\": \"{a_core}\" }} }}] }}\n",
            "  ]\n",
            "}}"
        ),
        a_mod = url("a/mod.ts"),
        a_core = url("a/core.ts"),
        b_mod = url("b/mod.ts"),
    )
}

/// A two-package tree in the old single-version layout.
///
/// Package `a` has a public submodule and an internal helper; package `b`
/// depends on `a` and documents itself with a legacy URL import.
fn seed_tree(tmp: &TempDir) -> PathBuf {
    let root = tmp.path().join("tree");
    fs::create_dir(&root).unwrap();

    write_file(&root.join("deno.json"), "{\n  \"version\": \"0.213.1\"\n}\n");
    write_file(&root.join("a/mod.ts"), "export * from \"./core.ts\";\n");
    write_file(&root.join("a/core.ts"), "export const A = 1;\n");
    write_file(&root.join("a/_internal.ts"), "export const SECRET = 2;\n");
    write_file(
        &root.join("b/mod.ts"),
        "import { A } from \"../a/core.ts\";\nexport const B = A + 1;\n",
    );
    write_file(&root.join("b/b_test.ts"), "import { B } from \"./mod.ts\";\n");
    write_file(
        &root.join("b/README.md"),
        "```ts\nimport { B } from \"https://deno.land/std@$STD_VERSION/b/mod.ts\";\n```\n",
    );

    let canonical = root.canonicalize().unwrap();
    let analyzer = install_analyzer(tmp.path(), &fixture_graph(&canonical));
    write_file(
        &root.join("flotilla.toml"),
        &format!("[analyzer]\ncommand = \"{}\"\nargs = []\n", analyzer.display()),
    );

    root
}

// ============================================================================
// flotilla convert
// ============================================================================

#[test]
fn test_convert_rewrites_cross_package_imports() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla()
        .args(["convert"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 2 packages"));

    assert_eq!(
        read(&root.join("b/mod.ts")),
        "import { A } from \"@std/a/core\";\nexport const B = A + 1;\n"
    );
    // Same-package imports stay relative.
    assert_eq!(read(&root.join("a/mod.ts")), "export * from \"./core.ts\";\n");
}

#[test]
fn test_convert_rewrites_legacy_doc_imports() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();

    let readme = read(&root.join("b/README.md"));
    assert!(readme.contains("from \"@std/b\""));
    assert!(!readme.contains("deno.land"));
}

#[test]
fn test_convert_emits_manifests_in_dependency_order() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();

    // `b` depends on `a`, so `a` must come first.
    let root_manifest = read_json(&root.join("deno.json"));
    assert_eq!(root_manifest["workspaces"], serde_json::json!(["./a", "./b"]));
    assert_eq!(
        root_manifest["imports"]["@std/a"],
        serde_json::json!("jsr:@std/a@^0.213.1")
    );
    assert_eq!(
        root_manifest["imports"]["@std/a/"],
        serde_json::json!("jsr:/@std/a@^0.213.1/")
    );

    // Multiple exports use the table form; internal modules are absent.
    let a = read_json(&root.join("a/deno.json"));
    assert_eq!(a["name"], "@std/a");
    assert_eq!(a["version"], "0.213.1");
    assert_eq!(
        a["exports"],
        serde_json::json!({ ".": "./mod.ts", "./core": "./core.ts" })
    );

    // A single root export collapses to the shorthand; tests are excluded.
    let b = read_json(&root.join("b/deno.json"));
    assert_eq!(b["exports"], serde_json::json!("./mod.ts"));
}

#[test]
fn test_convert_set_version_overrides_manifest() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla()
        .args(["convert", "--set-version", "9.9.9"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("9.9.9"));

    let a = read_json(&root.join("a/deno.json"));
    assert_eq!(a["version"], "9.9.9");
    let root_manifest = read_json(&root.join("deno.json"));
    assert_eq!(
        root_manifest["imports"]["@std/b"],
        serde_json::json!("jsr:@std/b@^9.9.9")
    );
}

#[test]
fn test_convert_rejects_invalid_version() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla()
        .args(["convert", "--set-version", "not-semver"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid semver"));
}

#[test]
fn test_convert_is_idempotent() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();

    let first = (
        read(&root.join("b/mod.ts")),
        read(&root.join("b/README.md")),
        read(&root.join("a/deno.json")),
        read(&root.join("deno.json")),
    );

    flotilla().args(["convert"]).current_dir(&root).assert().success();

    let second = (
        read(&root.join("b/mod.ts")),
        read(&root.join("b/README.md")),
        read(&root.join("a/deno.json")),
        read(&root.join("deno.json")),
    );
    assert_eq!(first, second);
}

#[test]
fn test_convert_dry_run_writes_nothing() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla()
        .args(["convert", "--dry-run"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(read(&root.join("b/mod.ts")).contains("../a/core.ts"));
    assert!(!root.join("a/deno.json").exists());
    assert!(!read(&root.join("deno.json")).contains("workspaces"));
}

#[test]
fn test_convert_fails_on_package_cycle() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    let canonical = root.canonicalize().unwrap();
    let url = |rel: &str| format!("file://{}/{}", canonical.display(), rel);
    let cyclic = format!(
        concat!(
            "{{ \"modules\": [\n",
            "  {{ \"specifier\": \"{a}\", \"dependencies\": [{{ \"code\": {{ \"specifier\": \"{b}\" }} }}] }},\n",
            "  {{ \"specifier\": \"{b}\", \"dependencies\": [{{ \"code\": {{ \"specifier\": \"{a}\" }} }}] }}\n",
            "] }}"
        ),
        a = url("a/mod.ts"),
        b = url("b/mod.ts"),
    );
    install_analyzer(tmp.path(), &cyclic);

    flotilla()
        .args(["convert"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular dependency"))
        .stderr(predicate::str::contains("a -> b -> a"));

    // Nothing was rewritten.
    assert!(read(&root.join("b/mod.ts")).contains("../a/core.ts"));
}

#[test]
fn test_convert_fails_on_malformed_analyzer_output() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);
    install_analyzer(tmp.path(), "deno: this is not a module graph");

    flotilla()
        .args(["convert"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed module graph output"));

    // Analysis failures abort before any file is touched.
    assert!(read(&root.join("b/mod.ts")).contains("../a/core.ts"));
    assert!(!root.join("a/deno.json").exists());
}

#[test]
fn test_convert_fails_on_import_outside_packages() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);
    write_file(
        &root.join("c/mod.ts"),
        "import { helper } from \"../_hidden/util.ts\";\n",
    );

    flotilla()
        .args(["convert"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolves outside every package"))
        .stderr(predicate::str::contains("_hidden/util.ts"));
}

#[test]
fn test_convert_fails_without_root_manifest() {
    let tmp = temp_dir();

    flotilla()
        .args(["convert"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no root manifest"));
}

#[test]
fn test_convert_fails_without_version() {
    let tmp = temp_dir();
    let root = tmp.path().join("tree");
    fs::create_dir(&root).unwrap();
    write_file(&root.join("deno.json"), "{}\n");
    write_file(&root.join("a/mod.ts"), "export {};\n");

    flotilla()
        .args(["convert"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no package version"));
}

// ============================================================================
// flotilla exports
// ============================================================================

#[test]
fn test_exports_updates_after_new_module() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();

    // A new public module appears after conversion.
    write_file(&root.join("b/extra.ts"), "export const EXTRA = 3;\n");

    flotilla()
        .args(["exports"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("b"));

    let b = read_json(&root.join("b/deno.json"));
    assert_eq!(
        b["exports"],
        serde_json::json!({ ".": "./mod.ts", "./extra": "./extra.ts" })
    );
    // Identity fields survive the exports rewrite.
    assert_eq!(b["name"], "@std/b");
}

#[test]
fn test_exports_check_fails_on_drift() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();
    write_file(&root.join("b/extra.ts"), "export const EXTRA = 3;\n");

    flotilla()
        .args(["exports", "--check"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of date"));

    // Check mode never writes.
    let b = read_json(&root.join("b/deno.json"));
    assert_eq!(b["exports"], serde_json::json!("./mod.ts"));
}

#[test]
fn test_exports_check_passes_when_synced() {
    let tmp = temp_dir();
    let root = seed_tree(&tmp);

    flotilla().args(["convert"]).current_dir(&root).assert().success();
    write_file(&root.join("b/extra.ts"), "export const EXTRA = 3;\n");
    flotilla().args(["exports"]).current_dir(&root).assert().success();

    flotilla()
        .args(["exports", "--check"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

// ============================================================================
// flotilla completions
// ============================================================================

#[test]
fn test_completions_bash() {
    flotilla()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flotilla"));
}
