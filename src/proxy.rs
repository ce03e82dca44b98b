//! Selector-gated proxy archiver.
//!
//! Every content-adding operation on the target archive goes through this
//! façade. It guards against re-including the assembly's own
//! working/staging directory, applies the configured root prefix, and
//! gates every candidate entry through one shared, ordered selector chain
//! exactly once before forwarding to the underlying writer.

use crate::archiver::{Archiver, EntrySelector, FileEntry, FileSet};
use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::rc::Rc;

/// Façade over an [`Archiver`] that filters and prefixes every entry.
///
/// One proxy serves one assembly run; it must not be shared across runs.
pub struct ProxyArchiver<A> {
    delegate: A,
    prefix: String,
    working_dir: Utf8PathBuf,
    selectors: Vec<Rc<dyn EntrySelector>>,
}

impl<A: Archiver> ProxyArchiver<A> {
    /// Wrap a writer.
    ///
    /// `prefix` is prepended to every destination path (empty or
    /// `/`-terminated); `working_dir` is the staging area that must never
    /// end up inside the archive; `selectors` is the ordered decision
    /// chain applied once per candidate entry.
    #[must_use]
    pub fn new(
        delegate: A,
        prefix: String,
        working_dir: Utf8PathBuf,
        selectors: Vec<Rc<dyn EntrySelector>>,
    ) -> Self {
        Self {
            delegate,
            prefix,
            working_dir,
            selectors,
        }
    }

    /// Add a single file at an archive path.
    ///
    /// The selector chain is consulted exactly once, against the source
    /// file; a rejected file is silently dropped.
    ///
    /// # Errors
    ///
    /// Propagates selector and writer failures unchanged.
    pub fn add_file(&mut self, source: &Utf8Path, dest_path: &str, mode: i32) -> Result<()> {
        let entry = FileEntry {
            name: source.as_str().to_owned(),
            is_file: true,
        };
        if !self.accept(&entry)? {
            debug!("selector chain rejected {source}; not adding to archive");
            return Ok(());
        }
        let dest = format!("{}{}", self.prefix, dest_path);
        self.delegate.add_file(source, &dest, mode)
    }

    /// Add a whole directory recursively with default selection rules.
    ///
    /// Sugar over [`Self::add_file_set`]; a directory holding N files
    /// invokes each selector exactly N times, once per file.
    ///
    /// # Errors
    ///
    /// Propagates writer failures unchanged.
    pub fn add_directory(&mut self, directory: &Utf8Path) -> Result<()> {
        self.add_file_set(&FileSet::for_directory(directory))
    }

    /// Delegate a file set, guarding against working-directory
    /// self-inclusion.
    ///
    /// A set rooted exactly at the working directory is a no-op. A set
    /// whose directory is a strict ancestor of the working directory gets
    /// one extra exclude pattern, the working directory's base name, so
    /// every sibling is still delivered.
    ///
    /// # Errors
    ///
    /// Propagates writer failures unchanged.
    pub fn add_file_set(&mut self, file_set: &FileSet) -> Result<()> {
        if file_set.directory == self.working_dir {
            debug!(
                "skipping file set rooted at assembly working directory {}",
                self.working_dir
            );
            return Ok(());
        }

        let mut effective = file_set.clone();
        if self.working_dir.starts_with(&file_set.directory) {
            if let Some(name) = self.working_dir.file_name() {
                debug!(
                    "file set at {} contains the assembly working directory; excluding {name}",
                    file_set.directory
                );
                effective.excludes.push(name.to_owned());
            }
        }
        effective.prefix = format!("{}{}", self.prefix, effective.prefix);

        self.delegate.add_file_set(&effective, &self.selectors)
    }

    /// Expand an existing archive under a destination prefix (unpack-add).
    ///
    /// Every extracted file entry passes the selector chain exactly once,
    /// like any other content-adding operation.
    ///
    /// # Errors
    ///
    /// Propagates selector and writer failures unchanged.
    pub fn add_archived_file_set(&mut self, source: &Utf8Path, dest_prefix: &str) -> Result<()> {
        let dest = format!("{}{}", self.prefix, dest_prefix);
        self.delegate
            .add_archived_file_set(source, &dest, &self.selectors)
    }

    /// Forwarded transparently to the writer.
    pub fn set_forced(&mut self, forced: bool) {
        self.delegate.set_forced(forced);
    }

    /// The writer's default directory mode.
    #[must_use]
    pub fn override_dir_mode(&self) -> i32 {
        self.delegate.override_dir_mode()
    }

    /// The writer's default file mode.
    #[must_use]
    pub fn override_file_mode(&self) -> i32 {
        self.delegate.override_file_mode()
    }

    /// Finalise the archive through the writer.
    ///
    /// # Errors
    ///
    /// Propagates writer failures unchanged.
    pub fn create_archive(&mut self) -> Result<()> {
        self.delegate.create_archive()
    }

    /// Borrow the wrapped writer.
    #[must_use]
    pub fn inner(&self) -> &A {
        &self.delegate
    }

    /// Unwrap the proxy and recover the writer.
    #[must_use]
    pub fn into_inner(self) -> A {
        self.delegate
    }

    fn accept(&self, entry: &FileEntry) -> Result<bool> {
        for selector in &self.selectors {
            if !selector.is_selected(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
