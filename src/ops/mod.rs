//! High-level operations, one per CLI command.

pub mod convert;
pub mod prepare;
pub mod sync_exports;

pub use convert::{convert, ConvertOptions, ConvertReport};
pub use prepare::prepare_tree;
pub use sync_exports::{sync_exports, SyncReport};
