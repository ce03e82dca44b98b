//! Shared test doubles for the assembly core.

use crate::archiver::{Archiver, EntrySelector, FileEntry, FileSet};
use crate::error::Result;
use crate::modes::UNSET_MODE;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::Cell;
use std::rc::Rc;

/// A delegated file-set addition recorded by [`RecordingArchiver`].
#[derive(Debug, Clone)]
pub struct RecordedFileSet {
    /// The file set exactly as the writer received it.
    pub file_set: FileSet,
    /// How many selectors accompanied the call.
    pub selector_count: usize,
}

/// Archive writer that records every delegated call instead of writing
/// bytes.
#[derive(Debug, Default)]
pub struct RecordingArchiver {
    /// `(source, dest, mode)` triples from `add_file`.
    pub files: Vec<(Utf8PathBuf, String, i32)>,
    /// File sets delegated via `add_file_set`.
    pub file_sets: Vec<RecordedFileSet>,
    /// `(source, dest_prefix)` pairs from `add_archived_file_set`.
    pub unpacked: Vec<(Utf8PathBuf, String)>,
    /// Last value passed to `set_forced`.
    pub forced: Option<bool>,
    /// Value reported by `override_dir_mode`.
    pub dir_mode: i32,
    /// Value reported by `override_file_mode`.
    pub file_mode: i32,
    /// Whether `create_archive` ran.
    pub finalized: bool,
}

impl RecordingArchiver {
    /// Recording writer with unset override modes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir_mode: UNSET_MODE,
            file_mode: UNSET_MODE,
            ..Self::default()
        }
    }

    /// Recording writer reporting the given override modes.
    #[must_use]
    pub fn with_override_modes(dir_mode: i32, file_mode: i32) -> Self {
        Self {
            dir_mode,
            file_mode,
            ..Self::new()
        }
    }
}

impl Archiver for RecordingArchiver {
    fn add_file(&mut self, source: &Utf8Path, dest_path: &str, mode: i32) -> Result<()> {
        self.files
            .push((source.to_owned(), dest_path.to_owned(), mode));
        Ok(())
    }

    fn add_file_set(
        &mut self,
        file_set: &FileSet,
        selectors: &[Rc<dyn EntrySelector>],
    ) -> Result<()> {
        self.file_sets.push(RecordedFileSet {
            file_set: file_set.clone(),
            selector_count: selectors.len(),
        });
        Ok(())
    }

    fn add_archived_file_set(
        &mut self,
        source: &Utf8Path,
        dest_prefix: &str,
        _selectors: &[Rc<dyn EntrySelector>],
    ) -> Result<()> {
        self.unpacked
            .push((source.to_owned(), dest_prefix.to_owned()));
        Ok(())
    }

    fn set_forced(&mut self, forced: bool) {
        self.forced = Some(forced);
    }

    fn override_dir_mode(&self) -> i32 {
        self.dir_mode
    }

    fn override_file_mode(&self) -> i32 {
        self.file_mode
    }

    fn create_archive(&mut self) -> Result<()> {
        self.finalized = true;
        Ok(())
    }
}

/// Selector that counts how often its decision function runs on files.
#[derive(Debug)]
pub struct CountingSelector {
    count: Cell<usize>,
    answer: bool,
}

impl CountingSelector {
    /// Counting selector that always answers `answer`.
    #[must_use]
    pub fn new(answer: bool) -> Self {
        Self {
            count: Cell::new(0),
            answer,
        }
    }

    /// Number of file entries the selector has been consulted about.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl EntrySelector for CountingSelector {
    fn is_selected(&self, entry: &FileEntry) -> std::io::Result<bool> {
        if entry.is_file {
            self.count.set(self.count.get() + 1);
        }
        Ok(self.answer)
    }
}
