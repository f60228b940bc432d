//! The logical file tree a container is read into and written from.
//!
//! A [`FileTree`] is a flat mapping from normalized entry path to [`Entry`],
//! rooted at the empty path. It is built fresh per request, exclusively
//! owned by one pipeline invocation, and discarded after the output
//! container is produced.
//!
//! The tree maintains one structural invariant at all times: every entry's
//! parent directory path is present as a [`EntryKind::Directory`] entry.
//! Implicit directories are materialized on insertion, so the writer never
//! has to reconstruct them.

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::{EntryPath, Error, Result};

/// What an entry is, and its payload when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file owning its payload bytes.
    File {
        /// The entry's content, fully materialized.
        payload: Vec<u8>,
    },
    /// A directory marker. Directories own no bytes.
    Directory,
}

/// One member of the container tree.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Normalized path within the tree.
    pub path: EntryPath,
    /// File payload or directory marker.
    pub kind: EntryKind,
    /// Best-effort modification time.
    pub modified: Option<SystemTime>,
    /// Best-effort unix permission bits.
    pub unix_mode: Option<u32>,
}

impl Entry {
    /// Creates a file entry owning `payload`.
    pub fn file(path: EntryPath, payload: Vec<u8>) -> Self {
        Self {
            path,
            kind: EntryKind::File { payload },
            modified: None,
            unix_mode: None,
        }
    }

    /// Creates a directory entry.
    pub fn directory(path: EntryPath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            modified: None,
            unix_mode: None,
        }
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Sets the unix permission bits.
    #[must_use]
    pub fn with_unix_mode(mut self, mode: u32) -> Self {
        self.unix_mode = Some(mode);
        self
    }

    /// Returns true if this entry is a file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File { .. })
    }

    /// Returns true if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Returns the payload bytes for files, `None` for directories.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::File { payload } => Some(payload),
            EntryKind::Directory => None,
        }
    }

    /// Returns the final path segment.
    pub fn name(&self) -> &str {
        self.path.file_name()
    }
}

/// Outcome of a tree insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Whether an existing file entry at the same path was replaced.
    pub replaced: bool,
    /// Number of missing parent directories materialized by this insert.
    pub directories_created: usize,
}

/// A request-scoped tree of container entries, keyed by normalized path.
#[derive(Debug, Default)]
pub struct FileTree {
    entries: BTreeMap<String, Entry>,
}

impl FileTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by its normalized path.
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Returns true if an entry exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterates over all entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Iterates over the normalized paths of all entries, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the immediate children of a directory.
    ///
    /// `parent` is `""` for the tree root, otherwise a directory path. The
    /// caller chooses the ordering; this returns path order.
    pub fn children(&self, parent: &str) -> Vec<&Entry> {
        if parent.is_empty() {
            self.entries
                .values()
                .filter(|e| e.path.is_root_level())
                .collect()
        } else {
            let prefix = format!("{}/", parent);
            self.entries
                .range(prefix.clone()..)
                .take_while(|(path, _)| path.starts_with(&prefix))
                .filter(|(path, _)| !path[prefix.len()..].contains('/'))
                .map(|(_, e)| e)
                .collect()
        }
    }

    /// Inserts an entry, materializing missing parent directories.
    ///
    /// A file replaces an existing file at the same path; a directory insert
    /// over an existing directory is a no-op. A file/directory collision is
    /// an error: the tree would no longer describe one coherent hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] when the path (or one of its
    /// parents) is already occupied by an entry of the other kind.
    pub fn insert(&mut self, entry: Entry) -> Result<InsertOutcome> {
        let mut outcome = InsertOutcome {
            replaced: false,
            directories_created: self.materialize_parents(&entry.path)?,
        };

        match self.entries.get(entry.path.as_str()) {
            Some(existing) if existing.is_directory() && entry.is_file() => {
                return Err(Error::InvariantViolation(format!(
                    "path '{}' is already a directory",
                    entry.path
                )));
            }
            Some(existing) if existing.is_file() && entry.is_directory() => {
                return Err(Error::InvariantViolation(format!(
                    "path '{}' is already a file",
                    entry.path
                )));
            }
            Some(_) if entry.is_directory() => {
                // Re-inserting a known directory keeps the existing marker.
                return Ok(outcome);
            }
            Some(_) => outcome.replaced = true,
            None => {}
        }

        self.entries.insert(entry.path.as_str().to_string(), entry);
        Ok(outcome)
    }

    /// Ensures every ancestor of `path` exists as a directory entry.
    fn materialize_parents(&mut self, path: &EntryPath) -> Result<usize> {
        let mut created = 0;
        let mut missing = Vec::new();
        let mut cursor = path.parent();
        while let Some(dir) = cursor {
            match self.entries.get(dir.as_str()) {
                Some(existing) if existing.is_file() => {
                    return Err(Error::InvariantViolation(format!(
                        "parent path '{}' is a file, not a directory",
                        dir
                    )));
                }
                Some(_) => break,
                None => {
                    cursor = dir.parent();
                    missing.push(dir);
                }
            }
        }
        for dir in missing.into_iter().rev() {
            self.entries
                .insert(dir.as_str().to_string(), Entry::directory(dir));
            created += 1;
        }
        Ok(created)
    }
}
