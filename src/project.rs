//! Reactor project arena.
//!
//! The reactor is the flat set of projects participating in the current
//! build run. Projects form a rooted forest via parent links; the arena
//! stores them contiguously and links by index, so there are no ownership
//! cycles and descendant queries are simple chain walks.

use camino::{Utf8Path, Utf8PathBuf};

/// Packaging kind that never contributes a binary artifact.
pub const AGGREGATOR_PACKAGING: &str = "pom";

/// Handle to a project inside a [`ProjectArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(usize);

/// A built (or buildable) artifact attached to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Classifier distinguishing this artifact from the primary one
    /// (`"test"`, `"sources"`); `None` for the primary artifact.
    pub classifier: Option<String>,
    /// File extension of the artifact (`"tar.gz"`, `"jar"`).
    pub extension: String,
    /// Backing file on disk; `None` until the artifact has been built or
    /// resolved.
    pub file: Option<Utf8PathBuf>,
}

/// One node of the reactor forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Group coordinate.
    pub group: String,
    /// Artifact coordinate.
    pub artifact: String,
    /// Version coordinate.
    pub version: String,
    /// Packaging kind; [`AGGREGATOR_PACKAGING`] projects contribute no
    /// binary by definition.
    pub packaging: String,
    /// Base directory of the project's sources.
    pub base_dir: Utf8PathBuf,
    /// Parent project, if any. A weak back-reference by index, not an
    /// owning link.
    pub parent: Option<ProjectId>,
    /// The primary build artifact.
    pub primary_artifact: Option<ArtifactRef>,
    /// Secondary artifacts distinguished by classifier.
    pub attached_artifacts: Vec<ArtifactRef>,
}

impl Project {
    /// The `group:artifact` coordinate pair used by include/exclude
    /// pattern matching and error messages.
    #[must_use]
    pub fn coordinates(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Find an attached artifact by classifier.
    #[must_use]
    pub fn attached_artifact(&self, classifier: &str) -> Option<&ArtifactRef> {
        self.attached_artifacts
            .iter()
            .find(|a| a.classifier.as_deref() == Some(classifier))
    }

    /// Whether this project's packaging contributes no binary.
    #[must_use]
    pub fn is_aggregator(&self) -> bool {
        self.packaging == AGGREGATOR_PACKAGING
    }
}

/// Flat arena of reactor projects, indexed by [`ProjectId`].
#[derive(Debug, Clone, Default)]
pub struct ProjectArena {
    projects: Vec<Project>,
}

impl ProjectArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project and return its handle.
    pub fn push(&mut self, project: Project) -> ProjectId {
        let id = ProjectId(self.projects.len());
        self.projects.push(project);
        id
    }

    /// Look up a project by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this arena.
    #[must_use]
    pub fn get(&self, id: ProjectId) -> &Project {
        &self.projects[id.0]
    }

    /// Iterate over all `(id, project)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ProjectId, &Project)> {
        self.projects
            .iter()
            .enumerate()
            .map(|(i, p)| (ProjectId(i), p))
    }

    /// Number of projects in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the arena holds no projects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Walk the parent chain of `id`, starting from its direct parent.
    pub fn ancestors(&self, id: ProjectId) -> impl Iterator<Item = ProjectId> + '_ {
        std::iter::successors(self.get(id).parent, |&p| self.get(p).parent)
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    #[must_use]
    pub fn reaches(&self, id: ProjectId, ancestor: ProjectId) -> bool {
        self.ancestors(id).any(|p| p == ancestor)
    }

    /// Direct children of `id`, in insertion order.
    #[must_use]
    pub fn children_of(&self, id: ProjectId) -> Vec<ProjectId> {
        self.iter()
            .filter(|(_, p)| p.parent == Some(id))
            .map(|(child, _)| child)
            .collect()
    }
}

/// Convenience constructor for a project with coordinates and a base dir.
#[must_use]
pub fn project(group: &str, artifact: &str, version: &str, base_dir: &Utf8Path) -> Project {
    Project {
        group: group.to_owned(),
        artifact: artifact.to_owned(),
        version: version.to_owned(),
        packaging: "tar.gz".to_owned(),
        base_dir: base_dir.to_owned(),
        parent: None,
        primary_artifact: None,
        attached_artifacts: Vec::new(),
    }
}
