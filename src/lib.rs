//! Flotilla - converts a flat module tree into a multi-package workspace
//!
//! This crate provides the core library functionality for Flotilla:
//! package discovery, export table construction, dependency graph
//! analysis, import rewriting, and manifest emission.

pub mod core;
pub mod graph;
pub mod ops;
pub mod rewrite;
pub mod util;

pub use crate::core::{
    exports::ExportEntry, manifest::PackageManifest, package::Package, workspace::Workspace,
};

pub use crate::graph::{GraphError, PackageGraph};
pub use crate::rewrite::{RewriteError, Rewriter};
pub use crate::util::Config;
