//! Archive writer contract.
//!
//! The core never serialises archive bytes itself; it drives an
//! [`Archiver`] implementation through this interface. The bundled
//! [`crate::tar_gz::TarGzArchiver`] is one such writer; hosts may supply
//! their own for other container formats.

use crate::error::Result;
use crate::modes::UNSET_MODE;
use camino::{Utf8Path, Utf8PathBuf};
use std::rc::Rc;

/// A candidate entry presented to selectors before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Entry name: the archive-relative path for file-set entries, or the
    /// source path for single-file adds.
    pub name: String,
    /// Whether the entry is a regular file (directories are presented
    /// during traversal but typically ignored by selectors).
    pub is_file: bool,
}

/// Decides whether a candidate entry is written to the archive.
///
/// Writers must consult each selector exactly once per candidate file,
/// regardless of which convenience operation introduced the entry.
///
/// Naming contract: file-set expansion and unpack-add present the
/// archive-relative entry path as [`FileEntry::name`]; single-file adds
/// present the source path, since the entry exists nowhere else yet.
pub trait EntrySelector {
    /// Whether the entry should be written.
    ///
    /// # Errors
    ///
    /// May fail with an I/O error when the decision requires inspecting
    /// the underlying file.
    fn is_selected(&self, entry: &FileEntry) -> std::io::Result<bool>;
}

/// A source directory plus selection and placement rules, ready for a
/// writer to expand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    /// Source directory on disk.
    pub directory: Utf8PathBuf,
    /// Destination prefix inside the archive; empty or `/`-terminated.
    pub prefix: String,
    /// Include glob patterns; empty selects everything.
    pub includes: Vec<String>,
    /// Exclude glob patterns; matching files and subtrees are dropped.
    pub excludes: Vec<String>,
    /// Directory mode, or [`UNSET_MODE`] to let the writer decide.
    pub dir_mode: i32,
    /// File mode, or [`UNSET_MODE`] to let the writer decide.
    pub file_mode: i32,
}

impl FileSet {
    /// File set covering a whole directory with default selection rules.
    #[must_use]
    pub fn for_directory(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: String::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
            dir_mode: UNSET_MODE,
            file_mode: UNSET_MODE,
        }
    }
}

/// Content-adding operations of an archive writer.
///
/// Implementations serialise entries into a concrete container format.
/// Ordering must be deterministic; the core adds entries from a single
/// thread and never shares a writer across assembly runs.
pub trait Archiver {
    /// Add a single file at an archive path with an explicit mode
    /// ([`UNSET_MODE`] inherits the writer default).
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be read or the entry cannot be
    /// recorded.
    fn add_file(&mut self, source: &Utf8Path, dest_path: &str, mode: i32) -> Result<()>;

    /// Expand a file set into entries, consulting `selectors` exactly
    /// once per candidate file.
    ///
    /// The selector chain is shared (`Rc`) because one assembly run is
    /// single-threaded by contract and the same ordered chain gates every
    /// operation on the archive.
    ///
    /// # Errors
    ///
    /// Fails on traversal errors, selector failures, or invalid glob
    /// patterns.
    fn add_file_set(&mut self, file_set: &FileSet, selectors: &[Rc<dyn EntrySelector>])
    -> Result<()>;

    /// Expand an existing archive's entries under a destination prefix
    /// (the unpack-add path), consulting `selectors` exactly once per
    /// extracted file entry.
    ///
    /// # Errors
    ///
    /// Fails when the source archive cannot be read, or on selector
    /// failures.
    fn add_archived_file_set(
        &mut self,
        source: &Utf8Path,
        dest_prefix: &str,
        selectors: &[Rc<dyn EntrySelector>],
    ) -> Result<()>;

    /// Whether entries that look unchanged are re-added.
    fn set_forced(&mut self, forced: bool);

    /// Writer-level default directory mode, or [`UNSET_MODE`].
    fn override_dir_mode(&self) -> i32;

    /// Writer-level default file mode, or [`UNSET_MODE`].
    fn override_file_mode(&self) -> i32;

    /// Finalise and write the archive.
    ///
    /// # Errors
    ///
    /// Fails on archive I/O errors; nothing is guaranteed on disk after a
    /// failure.
    fn create_archive(&mut self) -> Result<()>;
}
