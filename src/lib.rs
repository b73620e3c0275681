//! Ctxweave: context-propagation refactoring kernel for Go codebases.
//!
//! This library automates threading a cancellation/deadline-carrying
//! context parameter through a target function or interface method and
//! every call site that invokes it, deciding per call site which context
//! expression to propagate from the enclosing lexical scope.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod apply;
pub mod cli;
pub mod confirm;
pub mod error;
pub mod instrument;
pub mod locate;
pub mod propagate;
pub mod rewrite;
pub mod scope;
pub mod tools;

/// Re-export common error types for convenience.
pub use error::{Result, WeaveError};

/// Ctxweave version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
