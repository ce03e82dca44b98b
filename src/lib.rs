//! Stowage assembly library.
//!
//! This crate plans and writes distribution archives from a multi-project
//! build tree. A descriptor declares module sets; each set selects
//! projects from the reactor and contributes their built artifacts,
//! dependency artifacts, and source trees to a single tar.gz archive. The
//! host supplies the reactor, the execution configuration, and the
//! external collaborators (dependency resolution and project building).
//!
//! # Modules
//!
//! - [`archiver`] - Archive writer and entry selector contracts
//! - [`descriptor`] - Assembly descriptor model
//! - [`error`] - Semantic error types for an assembly run
//! - [`interpolate`] - Output-path template interpolation
//! - [`modes`] - Octal permission mode parsing
//! - [`module_graph`] - Module selection over the reactor hierarchy
//! - [`phase`] - Module-set contribution planning and orchestration
//! - [`project`] - Reactor project model and arena
//! - [`proxy`] - Selector-gated proxy archiver
//! - [`resolver`] - External collaborator contracts
//! - [`tar_gz`] - Buffering tar.gz archive writer

pub mod archiver;
pub mod descriptor;
pub mod error;
pub mod interpolate;
pub mod modes;
pub mod module_graph;
pub mod phase;
pub mod project;
pub mod proxy;
pub mod resolver;
pub mod tar_gz;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{AssemblyError, Result};
