//! Error types for the assembly core.
//!
//! This module defines semantic error variants for everything that can
//! abort an assembly run. Non-fatal degradations (malformed mode strings,
//! empty module-set lists) are logged by the modules that detect them and
//! never surface here.

use thiserror::Error;

/// Errors that can abort an assembly run.
///
/// Every variant is fatal to the current run: the archive is never
/// finalised after one of these is raised, so a caller either gets a
/// complete archive or none at all.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// An attachment classifier matched no attached artifact on a project.
    #[error("no attached artifact with classifier {classifier} on project {project}")]
    MissingAttachment {
        /// Coordinates of the project that lacks the attachment.
        project: String,
        /// The classifier that failed to match.
        classifier: String,
    },

    /// A selected artifact has no backing file (not yet built or resolved).
    #[error("artifact for project {project} has no backing file; build it before assembling")]
    ArtifactFileMissing {
        /// Coordinates of the project whose artifact is missing a file.
        project: String,
    },

    /// A template referenced a token the interpolation context cannot supply.
    #[error("unknown token ${{{token}}} in template {template:?}")]
    Interpolation {
        /// The template that failed to interpolate.
        template: String,
        /// The unresolvable token.
        token: String,
    },

    /// The dependency resolver failed for a project.
    #[error("dependency resolution failed for {project}: {reason}")]
    DependencyResolution {
        /// Coordinates of the project whose dependencies failed to resolve.
        project: String,
        /// Description of the resolver failure.
        reason: String,
    },

    /// The project builder could not re-derive a project from its manifest.
    #[error("failed to build project from {manifest}: {reason}")]
    ProjectBuild {
        /// Path to the manifest that failed to build.
        manifest: String,
        /// Description of the build failure.
        reason: String,
    },

    /// The underlying archive writer failed.
    #[error("archive writer error: {reason}")]
    Archive {
        /// Description of the writer failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`AssemblyError`].
pub type Result<T> = std::result::Result<T, AssemblyError>;
