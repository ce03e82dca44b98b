//! External collaborator contracts.
//!
//! Dependency resolution and project construction live outside the core;
//! the phase consumes them through these traits so hosts can plug in a
//! registry-backed resolver, a cache, or a test double.

use crate::error::Result;
use crate::project::Project;
use camino::{Utf8Path, Utf8PathBuf};

/// A dependency artifact handed back by a [`DependencyResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Group coordinate.
    pub group: String,
    /// Artifact coordinate.
    pub artifact: String,
    /// Version coordinate.
    pub version: String,
    /// Classifier, if the dependency is a secondary artifact.
    pub classifier: Option<String>,
    /// File extension of the artifact.
    pub extension: String,
    /// Resolved file on disk; `None` when resolution produced metadata
    /// but no local file.
    pub file: Option<Utf8PathBuf>,
}

/// Resolves a project's transitive dependency artifacts.
pub trait DependencyResolver {
    /// Resolve the dependency set for `project`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::AssemblyError::DependencyResolution`] when the
    /// underlying resolution fails; the caller aborts the run rather than
    /// retrying.
    fn resolve_dependency_sets(&self, project: &Project) -> Result<Vec<ResolvedDependency>>;
}

/// Builds a full [`Project`] node from its on-disk definition.
///
/// Used when module metadata must be re-derived rather than taken from
/// the reactor, e.g. before resolving a module's dependencies, so the
/// resolved set reflects the manifest on disk rather than a trimmed
/// reactor node.
pub trait ProjectBuilder {
    /// Build the project rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::AssemblyError::ProjectBuild`] when the
    /// project definition cannot be read or understood.
    fn build_project(&self, base_dir: &Utf8Path) -> Result<Project>;
}
