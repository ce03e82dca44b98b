//! Bundled `.tar.gz` archive writer.
//!
//! Entries are buffered as they are planned and the container is only
//! serialised in [`Archiver::create_archive`], so an aborted run leaves no
//! half-written archive behind. File-set expansion walks the source
//! directory with `walkdir` and matches include/exclude globs with
//! `globset`.

use crate::archiver::{Archiver, EntrySelector, FileEntry, FileSet};
use crate::error::{AssemblyError, Result};
use crate::modes::UNSET_MODE;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use globset::{GlobSet, GlobSetBuilder};
use log::debug;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::rc::Rc;

/// Fallback file mode when neither the entry nor the writer supplies one
/// and the source metadata is unavailable.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Fallback directory mode.
const DEFAULT_DIR_MODE: u32 = 0o755;

#[derive(Debug, Clone)]
enum EntryContent {
    /// Copied from a file on disk at serialisation time.
    File(Utf8PathBuf),
    /// Raw bytes, used for entries lifted out of an unpacked archive.
    Bytes(Vec<u8>),
    /// Directory marker entry.
    Directory,
}

#[derive(Debug, Clone)]
struct PlannedEntry {
    dest: String,
    content: EntryContent,
    mode: i32,
}

/// Archive writer producing a gzip-compressed tarball.
pub struct TarGzArchiver {
    dest_file: Utf8PathBuf,
    entries: Vec<PlannedEntry>,
    index: BTreeMap<String, usize>,
    forced: bool,
    dir_mode: i32,
    file_mode: i32,
}

impl TarGzArchiver {
    /// Writer targeting `dest_file`; nothing touches the filesystem until
    /// [`Archiver::create_archive`].
    #[must_use]
    pub fn new(dest_file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dest_file: dest_file.into(),
            entries: Vec::new(),
            index: BTreeMap::new(),
            forced: true,
            dir_mode: UNSET_MODE,
            file_mode: UNSET_MODE,
        }
    }

    /// Set the writer-level default directory mode.
    pub fn set_override_dir_mode(&mut self, mode: i32) {
        self.dir_mode = mode;
    }

    /// Set the writer-level default file mode.
    pub fn set_override_file_mode(&mut self, mode: i32) {
        self.file_mode = mode;
    }

    /// Destination the archive will be written to.
    #[must_use]
    pub fn dest_file(&self) -> &Utf8Path {
        &self.dest_file
    }

    /// Number of planned entries.
    #[must_use]
    pub fn planned_entries(&self) -> usize {
        self.entries.len()
    }

    fn plan(&mut self, dest: String, content: EntryContent, mode: i32) {
        if let Some(&existing) = self.index.get(&dest) {
            if self.forced {
                self.entries[existing] = PlannedEntry {
                    dest,
                    content,
                    mode,
                };
            } else {
                debug!("skipping duplicate archive entry {dest}");
            }
            return;
        }
        self.index.insert(dest.clone(), self.entries.len());
        self.entries.push(PlannedEntry {
            dest,
            content,
            mode,
        });
    }

    fn resolved_file_mode(&self, entry_mode: i32, source: Option<&Utf8Path>) -> u32 {
        resolve_mode(entry_mode, self.file_mode)
            .unwrap_or_else(|| source.and_then(source_mode).unwrap_or(DEFAULT_FILE_MODE))
    }

    fn resolved_dir_mode(&self, entry_mode: i32) -> u32 {
        resolve_mode(entry_mode, self.dir_mode).unwrap_or(DEFAULT_DIR_MODE)
    }
}

impl Archiver for TarGzArchiver {
    fn add_file(&mut self, source: &Utf8Path, dest_path: &str, mode: i32) -> Result<()> {
        self.plan(dest_path.to_owned(), EntryContent::File(source.to_owned()), mode);
        Ok(())
    }

    fn add_file_set(
        &mut self,
        file_set: &FileSet,
        selectors: &[Rc<dyn EntrySelector>],
    ) -> Result<()> {
        let includes = build_glob_set(&file_set.includes)?;
        let excludes = build_glob_set(&file_set.excludes)?;
        let mut dirs = BTreeSet::new();

        let walker = walkdir::WalkDir::new(&file_set.directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let Some(rel) = relative_name(entry.path(), &file_set.directory) else {
                    return false;
                };
                // Never descend into an excluded subtree.
                !(entry.file_type().is_dir() && !rel.is_empty() && excludes.is_match(&rel))
            });

        for entry in walker {
            let entry = entry.map_err(io_error)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_name(entry.path(), &file_set.directory) else {
                continue;
            };
            if excludes.is_match(&rel) {
                continue;
            }
            if !file_set.includes.is_empty() && !includes.is_match(&rel) {
                continue;
            }

            let candidate = FileEntry {
                name: rel.clone(),
                is_file: true,
            };
            if !accept(selectors, &candidate)? {
                debug!("selector chain rejected file-set entry {rel}");
                continue;
            }

            if let Some(parent) = Utf8Path::new(&rel).parent() {
                if !parent.as_str().is_empty() {
                    dirs.insert(parent.as_str().to_owned());
                }
            }
            let source = Utf8PathBuf::try_from(entry.path().to_owned())
                .map_err(|e| AssemblyError::Archive {
                    reason: format!("non-UTF-8 path in file set: {e}"),
                })?;
            let dest = format!("{}{rel}", file_set.prefix);
            self.plan(dest, EntryContent::File(source), file_set.file_mode);
        }

        // Directory markers are only worth writing when a mode is pinned;
        // tar readers create intermediate directories implicitly.
        if resolve_mode(file_set.dir_mode, self.dir_mode).is_some() {
            for dir in dirs {
                let dest = format!("{}{dir}/", file_set.prefix);
                self.plan(dest, EntryContent::Directory, file_set.dir_mode);
            }
        }

        Ok(())
    }

    fn add_archived_file_set(
        &mut self,
        source: &Utf8Path,
        dest_prefix: &str,
        selectors: &[Rc<dyn EntrySelector>],
    ) -> Result<()> {
        let file = fs::File::open(source)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?;
            let rel = path.to_string_lossy().into_owned();
            let candidate = FileEntry {
                name: rel.clone(),
                is_file: true,
            };
            if !accept(selectors, &candidate)? {
                debug!("selector chain rejected unpacked entry {rel}");
                continue;
            }
            let mode = entry
                .header()
                .mode()
                .map_or(UNSET_MODE, |m| i32::try_from(m).unwrap_or(UNSET_MODE));
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            self.plan(
                format!("{dest_prefix}{rel}"),
                EntryContent::Bytes(bytes),
                mode,
            );
        }
        Ok(())
    }

    fn set_forced(&mut self, forced: bool) {
        self.forced = forced;
    }

    fn override_dir_mode(&self) -> i32 {
        self.dir_mode
    }

    fn override_file_mode(&self) -> i32 {
        self.file_mode
    }

    fn create_archive(&mut self) -> Result<()> {
        let output = fs::File::create(&self.dest_file)?;
        let encoder = GzEncoder::new(output, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for entry in &self.entries {
            let mut header = tar::Header::new_gnu();
            match &entry.content {
                EntryContent::File(path) => {
                    let bytes = fs::read(path)?;
                    header.set_size(bytes.len() as u64);
                    header.set_mode(self.resolved_file_mode(entry.mode, Some(path)));
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_cksum();
                    builder.append_data(&mut header, &entry.dest, bytes.as_slice())?;
                }
                EntryContent::Bytes(bytes) => {
                    header.set_size(bytes.len() as u64);
                    header.set_mode(self.resolved_file_mode(entry.mode, None));
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_cksum();
                    builder.append_data(&mut header, &entry.dest, bytes.as_slice())?;
                }
                EntryContent::Directory => {
                    header.set_size(0);
                    header.set_mode(self.resolved_dir_mode(entry.mode));
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_cksum();
                    builder.append_data(&mut header, &entry.dest, std::io::empty())?;
                }
            }
        }

        let encoder = builder.into_inner()?;
        encoder.finish()?;
        Ok(())
    }
}

fn accept(selectors: &[Rc<dyn EntrySelector>], entry: &FileEntry) -> Result<bool> {
    for selector in selectors {
        if !selector.is_selected(entry)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Pick the explicit entry mode, then the writer override, else `None`.
fn resolve_mode(entry_mode: i32, override_mode: i32) -> Option<u32> {
    if entry_mode >= 0 {
        return u32::try_from(entry_mode).ok();
    }
    if override_mode >= 0 {
        return u32::try_from(override_mode).ok();
    }
    None
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| AssemblyError::Archive {
                reason: format!("invalid glob pattern {pattern:?}: {e}"),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| AssemblyError::Archive {
        reason: format!("glob set: {e}"),
    })
}

fn relative_name(path: &std::path::Path, base: &Utf8Path) -> Option<String> {
    let rel = path.strip_prefix(base.as_std_path()).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn io_error(err: walkdir::Error) -> AssemblyError {
    err.into_io_error().map_or_else(
        || AssemblyError::Archive {
            reason: "directory walk failed".to_owned(),
        },
        AssemblyError::Io,
    )
}

#[cfg(unix)]
fn source_mode(path: &Utf8Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn source_mode(_path: &Utf8Path) -> Option<u32> {
    None
}

#[cfg(test)]
#[path = "tar_gz_tests.rs"]
mod tests;
