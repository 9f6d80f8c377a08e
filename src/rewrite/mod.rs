//! Import scanning and rewriting.

pub mod errors;
pub mod rewriter;
pub mod scanner;

pub use errors::RewriteError;
pub use rewriter::Rewriter;
pub use scanner::{ImportKind, ImportReference, Scanner};
