//! Core domain types: workspaces, packages, export tables, and manifests.

pub mod exports;
pub mod manifest;
pub mod package;
pub mod workspace;

pub use package::Package;
pub use workspace::Workspace;
