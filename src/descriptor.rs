//! Assembly descriptor model.
//!
//! The descriptor declares what a finished archive should contain. It is
//! handed to the core fully populated and is read-only for the duration of
//! an assembly run; how a host deserialises it (TOML, XML, hand-built) is
//! the host's business, so the types here only carry the serde derives.

use serde::{Deserialize, Serialize};

/// Root configuration for one output archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssemblyDescriptor {
    /// Identifier for the assembly, used in log output only.
    pub id: String,
    /// Whether archive content is nested under a `<final-name>/` root.
    pub include_base_directory: bool,
    /// Module-set declarations, applied in order.
    pub module_sets: Vec<ModuleSet>,
}

impl AssemblyDescriptor {
    /// Root prefix for archive entries.
    ///
    /// `"<final_name>/"` when the descriptor asks for a base directory,
    /// otherwise empty.
    #[must_use]
    pub fn base_prefix(&self, final_name: &str) -> String {
        if self.include_base_directory {
            format!("{final_name}/")
        } else {
            String::new()
        }
    }
}

/// A rule selecting a subset of the reactor plus what to contribute from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModuleSet {
    /// Include patterns on `group:artifact` coordinates. Empty means
    /// "all descendants of the root project".
    pub includes: Vec<String>,
    /// Exclude patterns on `group:artifact` coordinates. An excluded
    /// project takes its whole subtree with it.
    pub excludes: Vec<String>,
    /// Whether to descend past the root's direct children.
    pub include_sub_modules: bool,
    /// What to contribute from each selected project's built artifact.
    pub binaries: Option<ModuleBinaries>,
    /// What to contribute from each selected project's source tree.
    pub sources: Option<ModuleSources>,
}

/// Binary contribution spec for a module set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModuleBinaries {
    /// Destination directory template inside the archive.
    pub output_directory: String,
    /// Filename mapping template for each contributed artifact.
    pub output_file_name_mapping: String,
    /// Octal mode string for contributed files; unset inherits the
    /// archiver's default.
    pub file_mode: Option<String>,
    /// Expand the artifact into the archive instead of adding it opaque.
    pub unpack: bool,
    /// Also contribute each project's transitive dependency artifacts.
    pub include_dependencies: bool,
    /// Select an attached artifact by classifier instead of the primary.
    pub attachment_classifier: Option<String>,
}

impl Default for ModuleBinaries {
    fn default() -> Self {
        Self {
            output_directory: String::new(),
            output_file_name_mapping: crate::interpolate::DEFAULT_OUTPUT_FILE_NAME_MAPPING
                .to_owned(),
            file_mode: None,
            unpack: false,
            include_dependencies: true,
            attachment_classifier: None,
        }
    }
}

/// Source contribution spec for a module set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModuleSources {
    /// Structured file-set declarations, one delegated add per set.
    pub file_sets: Vec<FileSetConfig>,
    /// Nest each project's sources under `<artifact>/` in the archive.
    pub include_module_directory: bool,
    /// Exclude each child module's directory from the parent's sources so
    /// nested modules are not double-included.
    pub exclude_sub_module_directories: bool,
    /// Deprecated flat output directory (pre-file-set layout).
    pub output_directory: Option<String>,
    /// Deprecated flat include patterns.
    pub includes: Vec<String>,
    /// Deprecated flat exclude patterns.
    pub excludes: Vec<String>,
    /// Flat file mode; legacy-compatible, does not flag the layout as
    /// deprecated on its own.
    pub file_mode: Option<String>,
    /// Flat directory mode; legacy-compatible like `file_mode`.
    pub directory_mode: Option<String>,
}

impl ModuleSources {
    /// Whether the deprecated flat source layout is in use.
    ///
    /// True iff the flat output directory or the flat include/exclude
    /// patterns are set. Mode fields alone are structural no-ops and do
    /// not count.
    #[must_use]
    pub fn has_deprecated_layout(&self) -> bool {
        self.output_directory.is_some() || !self.includes.is_empty() || !self.excludes.is_empty()
    }
}

/// One declared file set: a source directory plus selection and placement
/// rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileSetConfig {
    /// Source directory, relative to the contributing project's base dir.
    pub directory: String,
    /// Destination directory inside the archive.
    pub output_directory: Option<String>,
    /// Include glob patterns; empty selects everything.
    pub includes: Vec<String>,
    /// Exclude glob patterns.
    pub excludes: Vec<String>,
    /// Octal mode string for directories.
    pub directory_mode: Option<String>,
    /// Octal mode string for files.
    pub file_mode: Option<String>,
}
