//! Whole-tree conversion to a multi-package workspace.
//!
//! Stage order matters here. The version is resolved first so a bad flag
//! fails before anything is touched. Analysis happens before any rewrite,
//! so a broken analyzer can never leave a half-rewritten tree. Manifests
//! are written last, once every import already has its final spelling.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::exports::build_export_table;
use crate::core::manifest::{update_root_manifest, PackageManifest};
use crate::core::package::discover_package_dirs;
use crate::core::{Package, Workspace};
use crate::graph::{build_package_graph, load_module_edges};
use crate::ops::prepare::prepare_tree;
use crate::rewrite::Rewriter;
use crate::util::fs;

/// Options for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Version for every emitted manifest, overriding the configuration
    /// and the root manifest
    pub set_version: Option<String>,

    /// Scope for package-qualified specifiers, overriding the
    /// configuration
    pub scope: Option<String>,

    /// Plan and report without writing anything
    pub dry_run: bool,
}

/// What a conversion run did.
#[derive(Debug)]
pub struct ConvertReport {
    pub version: String,

    /// Workspace members in dependency order
    pub members: Vec<String>,

    pub files_rewritten: usize,
    pub manifests_written: usize,
    pub dry_run: bool,
}

/// Convert the workspace tree.
pub fn convert(ws: &Workspace, options: &ConvertOptions) -> Result<ConvertReport> {
    let version = ws.resolve_version(options.set_version.as_deref())?;
    let scope = options
        .scope
        .clone()
        .unwrap_or_else(|| ws.config().workspace.scope.clone());
    info!("converting {} to a {} workspace", ws.root().display(), scope);

    prepare_tree(ws, options.dry_run)?;

    let names = discover_package_dirs(ws.root())?;
    if names.is_empty() {
        bail!("no packages found under {}", ws.root().display());
    }

    let manifest_name = ws.config().workspace.manifest.clone();
    let mut packages = Vec::with_capacity(names.len());
    for name in names {
        let root = ws.root().join(&name);
        let exports = build_export_table(&root, &manifest_name)
            .with_context(|| format!("failed to build export table for `{}`", name))?;
        debug!("{}: {} exports", name, exports.len());
        packages.push(Package::new(name, root, exports));
    }
    info!("discovered {} packages", packages.len());

    let edges = load_module_edges(ws, &packages)?;
    let package_graph = build_package_graph(&packages, &edges);
    let members = package_graph.topo_order()?;
    for name in &members {
        debug!("{} depends on [{}]", name, package_graph.deps(name).join(", "));
    }

    let rewriter = Rewriter::new(ws.root(), &scope, &packages, &ws.config().legacy.prefix)?;
    let files_rewritten = rewrite_tree(ws, &rewriter, options.dry_run)?;
    info!("rewrote {} files", files_rewritten);

    let manifests_written =
        write_manifests(ws, &packages, &members, &scope, &version, options.dry_run)?;

    if options.dry_run {
        info!("dry run, nothing was written");
    }

    Ok(ConvertReport {
        version,
        members,
        files_rewritten,
        manifests_written,
        dry_run: options.dry_run,
    })
}

/// Directories that are never rewrite targets: tool internals and test
/// fixtures resolve their imports in ways conversion must not touch.
const SKIP_DIRS: &[&str] = &[".git", "_tools", "testdata"];

fn should_descend(entry: &walkdir::DirEntry) -> bool {
    !(entry.file_type().is_dir()
        && SKIP_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
}

fn is_rewrite_target(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("md")
    )
}

fn rewrite_tree(ws: &Workspace, rewriter: &Rewriter<'_>, dry_run: bool) -> Result<usize> {
    let mut rewritten = 0;

    for entry in WalkDir::new(ws.root())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(should_descend)
    {
        let entry = entry.context("failed to walk the tree")?;
        if !entry.file_type().is_file() || !is_rewrite_target(entry.path()) {
            continue;
        }

        let text = fs::read_to_string(entry.path())?;
        let Some(new_text) = rewriter.rewrite(&text, entry.path())? else {
            continue;
        };

        let rel = fs::relative_path(ws.root(), entry.path());
        if dry_run {
            info!("would rewrite {}", rel.display());
        } else {
            fs::write_string(entry.path(), &new_text)?;
            debug!("rewrote {}", rel.display());
        }
        rewritten += 1;
    }

    Ok(rewritten)
}

fn write_manifests(
    ws: &Workspace,
    packages: &[Package],
    members: &[String],
    scope: &str,
    version: &str,
    dry_run: bool,
) -> Result<usize> {
    let manifest_name = &ws.config().workspace.manifest;
    let mut written = 0;

    for pkg in packages {
        let manifest = PackageManifest::for_package(pkg, scope, version);
        let path = pkg.root().join(manifest_name);
        if dry_run {
            info!(
                "would write {}",
                fs::relative_path(ws.root(), &path).display()
            );
        } else {
            fs::write_string(&path, &manifest.to_pretty_string()?)?;
            debug!("wrote manifest for {}", manifest.name);
        }
        written += 1;
    }

    let updated = update_root_manifest(
        &ws.manifest_text()?,
        members,
        scope,
        &ws.config().workspace.registry,
        version,
    )?;
    if dry_run {
        info!("would update root {}", manifest_name);
    } else {
        fs::write_string(&ws.manifest_path(), &updated)?;
        info!("updated root {}", manifest_name);
    }
    written += 1;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exports::ExportEntry;
    use serde_json::Value;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn seed_tree(files: &[(&str, &str)]) -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        std_fs::write(tmp.path().join("deno.json"), r#"{"version": "1.0.0"}"#).unwrap();
        for (name, contents) in files {
            let path = tmp.path().join(name);
            std_fs::create_dir_all(path.parent().unwrap()).unwrap();
            std_fs::write(path, contents).unwrap();
        }
        let ws = Workspace::open(tmp.path()).unwrap();
        (tmp, ws)
    }

    fn bare_packages(ws: &Workspace, names: &[&str]) -> Vec<Package> {
        names
            .iter()
            .map(|n| Package::new(*n, ws.root().join(n), vec![]))
            .collect()
    }

    #[test]
    fn test_rewrite_tree_skips_fixtures_and_tools() {
        let (tmp, ws) = seed_tree(&[
            ("a/mod.ts", "export const A = 1;\n"),
            ("b/mod.ts", "import { A } from \"../a/mod.ts\";\n"),
            ("b/testdata/fixture.ts", "import { A } from \"../../a/mod.ts\";\n"),
            ("_tools/gen.ts", "import { A } from \"../a/mod.ts\";\n"),
            (
                "b/README.md",
                "```ts\nimport { A } from \"https://deno.land/std@$STD_VERSION/a/mod.ts\";\n```\n",
            ),
        ]);
        let packages = bare_packages(&ws, &["a", "b"]);
        let rewriter = Rewriter::new(
            ws.root(),
            "@std",
            &packages,
            "https://deno.land/std@$STD_VERSION/",
        )
        .unwrap();

        let rewritten = rewrite_tree(&ws, &rewriter, false).unwrap();

        assert_eq!(rewritten, 2);
        assert_eq!(
            std_fs::read_to_string(tmp.path().join("b/mod.ts")).unwrap(),
            "import { A } from \"@std/a\";\n"
        );
        assert!(std_fs::read_to_string(tmp.path().join("b/README.md"))
            .unwrap()
            .contains("from \"@std/a\""));
        // Fixtures and tool sources keep their original imports.
        assert!(std_fs::read_to_string(tmp.path().join("b/testdata/fixture.ts"))
            .unwrap()
            .contains("../../a/mod.ts"));
        assert!(std_fs::read_to_string(tmp.path().join("_tools/gen.ts"))
            .unwrap()
            .contains("../a/mod.ts"));
    }

    #[test]
    fn test_rewrite_tree_dry_run_writes_nothing() {
        let (tmp, ws) = seed_tree(&[
            ("a/mod.ts", "export const A = 1;\n"),
            ("b/mod.ts", "import { A } from \"../a/mod.ts\";\n"),
        ]);
        let packages = bare_packages(&ws, &["a", "b"]);
        let rewriter = Rewriter::new(
            ws.root(),
            "@std",
            &packages,
            "https://deno.land/std@$STD_VERSION/",
        )
        .unwrap();

        let rewritten = rewrite_tree(&ws, &rewriter, true).unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(
            std_fs::read_to_string(tmp.path().join("b/mod.ts")).unwrap(),
            "import { A } from \"../a/mod.ts\";\n"
        );
    }

    #[test]
    fn test_write_manifests_emits_packages_and_root() {
        let (tmp, ws) = seed_tree(&[("a/mod.ts", ""), ("b/mod.ts", ""), ("b/extra.ts", "")]);
        let packages = vec![
            Package::new(
                "a",
                ws.root().join("a"),
                vec![ExportEntry {
                    key: ".".to_string(),
                    path: "./mod.ts".to_string(),
                }],
            ),
            Package::new(
                "b",
                ws.root().join("b"),
                vec![
                    ExportEntry {
                        key: ".".to_string(),
                        path: "./mod.ts".to_string(),
                    },
                    ExportEntry {
                        key: "./extra".to_string(),
                        path: "./extra.ts".to_string(),
                    },
                ],
            ),
        ];
        let members = vec!["a".to_string(), "b".to_string()];

        let written = write_manifests(&ws, &packages, &members, "@std", "1.0.0", false).unwrap();

        assert_eq!(written, 3);

        let a: Value =
            serde_json::from_str(&std_fs::read_to_string(tmp.path().join("a/deno.json")).unwrap())
                .unwrap();
        assert_eq!(a["name"], "@std/a");
        assert_eq!(a["exports"], "./mod.ts");

        let b: Value =
            serde_json::from_str(&std_fs::read_to_string(tmp.path().join("b/deno.json")).unwrap())
                .unwrap();
        assert_eq!(b["exports"]["./extra"], "./extra.ts");

        let root: Value =
            serde_json::from_str(&std_fs::read_to_string(tmp.path().join("deno.json")).unwrap())
                .unwrap();
        assert_eq!(root["workspaces"][0], "./a");
        assert_eq!(root["imports"]["@std/b"], "jsr:@std/b@^1.0.0");
    }

    #[test]
    fn test_write_manifests_dry_run() {
        let (tmp, ws) = seed_tree(&[("a/mod.ts", "")]);
        let packages = vec![Package::new(
            "a",
            ws.root().join("a"),
            vec![ExportEntry {
                key: ".".to_string(),
                path: "./mod.ts".to_string(),
            }],
        )];

        write_manifests(&ws, &packages, &["a".to_string()], "@std", "1.0.0", true).unwrap();

        assert!(!tmp.path().join("a/deno.json").exists());
        let root = std_fs::read_to_string(tmp.path().join("deno.json")).unwrap();
        assert!(!root.contains("workspaces"));
    }
}
