//! Dependency graph loading and ordering.

pub mod errors;
pub mod loader;
pub mod package_graph;

pub use errors::GraphError;
pub use loader::{load_module_edges, EdgeKind, ModuleEdge};
pub use package_graph::{build_package_graph, PackageGraph};
