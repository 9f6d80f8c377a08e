//! Module graph loading via the external analyzer.
//!
//! The converter does not parse source files to find their imports. It
//! synthesizes one entry module that imports every export of every package,
//! hands that to the analyzer subprocess, and reads the dependency graph
//! back as JSON. Only `file://` specifiers become edges; registry and
//! remote modules have no tree position to rewrite.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::core::{Package, Workspace};
use crate::graph::errors::GraphError;
use crate::util::fs;
use crate::util::process::{find_program, ProcessBuilder};

/// Whether an edge comes from a runtime import or a type-only resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Code,
    Types,
}

/// A file-to-file dependency reported by the analyzer.
#[derive(Debug, Clone)]
pub struct ModuleEdge {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: EdgeKind,
}

#[derive(Debug, Deserialize)]
struct GraphOutput {
    modules: Vec<GraphModule>,
}

#[derive(Debug, Deserialize)]
struct GraphModule {
    specifier: String,
    #[serde(default)]
    dependencies: Vec<GraphDependency>,
}

#[derive(Debug, Deserialize)]
struct GraphDependency {
    code: Option<GraphTarget>,
    types: Option<GraphTarget>,
}

/// Resolution slot of a dependency. The analyzer leaves `specifier` out
/// when resolution failed, so the field is optional rather than required.
#[derive(Debug, Deserialize)]
struct GraphTarget {
    specifier: Option<String>,
}

/// Source text of the synthetic entry module importing every export.
pub fn entry_source(packages: &[Package]) -> Result<String> {
    let mut source = String::new();
    for pkg in packages {
        for path in pkg.export_paths() {
            let url = Url::from_file_path(&path)
                .ok()
                .with_context(|| format!("export path is not absolute: {}", path.display()))?;
            source.push_str(&format!("import \"{}\";\n", url));
        }
    }
    Ok(source)
}

/// Run the analyzer over the whole tree and collect local dependency edges.
pub fn load_module_edges(ws: &Workspace, packages: &[Package]) -> Result<Vec<ModuleEdge>> {
    let entry_dir = tempfile::TempDir::new().context("failed to create entry module dir")?;
    let entry_path = entry_dir.path().join("entry.ts");
    fs::write_string(&entry_path, &entry_source(packages)?)?;

    let analyzer = &ws.config().analyzer;
    let program = find_program(&analyzer.command).map_err(|e| GraphError::AnalyzerFailed {
        command: analyzer.command.clone(),
        detail: format!("{:#}", e),
    })?;

    let builder = ProcessBuilder::new(&program)
        .args(&analyzer.args)
        .arg("--config")
        .arg(ws.manifest_path())
        .arg(&entry_path)
        .cwd(ws.root());
    debug!("running {}", builder.display_command());

    let output = builder
        .exec_and_check()
        .map_err(|e| GraphError::AnalyzerFailed {
            command: builder.display_command(),
            detail: format!("{:#}", e),
        })?;

    let json = String::from_utf8_lossy(&output.stdout);
    let edges = parse_module_graph(&json)?;
    debug!("analyzer reported {} local edges", edges.len());
    Ok(edges)
}

/// Parse analyzer JSON into dependency edges between local files.
pub fn parse_module_graph(json: &str) -> Result<Vec<ModuleEdge>, GraphError> {
    let output: GraphOutput =
        serde_json::from_str(json).map_err(|e| GraphError::MalformedOutput {
            reason: e.to_string(),
        })?;

    let mut edges = Vec::new();
    for module in &output.modules {
        let Some(from) = file_url_to_path(&module.specifier) else {
            continue;
        };

        for dep in &module.dependencies {
            push_edge(&mut edges, &from, &dep.code, EdgeKind::Code);
            push_edge(&mut edges, &from, &dep.types, EdgeKind::Types);
        }
    }
    Ok(edges)
}

fn push_edge(
    edges: &mut Vec<ModuleEdge>,
    from: &Path,
    target: &Option<GraphTarget>,
    kind: EdgeKind,
) {
    let specifier = target.as_ref().and_then(|t| t.specifier.as_deref());
    if let Some(to) = specifier.and_then(file_url_to_path) {
        edges.push(ModuleEdge {
            from: from.to_path_buf(),
            to,
            kind,
        });
    }
}

fn file_url_to_path(specifier: &str) -> Option<PathBuf> {
    let url = Url::parse(specifier).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok().map(|p| fs::normalize_lexical(&p))
}
