//! Applying named payload substitutions onto a file tree.
//!
//! A [`SubstitutionMap`] is an ordered set of `path → payload source`
//! mappings. Applying it overwrites (or creates) the file entry at each
//! mapped path; entries the map does not name are left byte-identical to
//! the source tree. Nothing is serialized here; the writer runs afterwards
//! over the mutated tree.
//!
//! # Ordering
//!
//! Mappings apply in declaration order. When two mappings target the same
//! path, the later one wins; the map is a vector rather than a hash map
//! precisely so this stays deterministic.
//!
//! # Example
//!
//! ```rust
//! use stagepack::{FileTree, SubstitutionMap};
//!
//! # fn main() -> stagepack::Result<()> {
//! let mut tree = FileTree::new();
//! let mut subs = SubstitutionMap::new();
//! subs.insert_bytes("textures/poster.png", b"png bytes".to_vec())?;
//! let result = subs.apply(&mut tree)?;
//! assert_eq!(result.entries_created, 1);
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::tree::{Entry, FileTree};
use crate::{EntryPath, Error, Result};

/// Where replacement bytes come from.
///
/// The caller resolves anything remote (an image fetched from a URL, say)
/// into one of these before the pipeline runs.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// Replacement bytes held inline.
    Bytes(Vec<u8>),
    /// Replacement bytes read from a file at apply time.
    File(PathBuf),
}

/// One `path → optional payload` mapping.
#[derive(Debug, Clone)]
struct Substitution {
    path: EntryPath,
    /// `None` means "leave any existing entry untouched".
    source: Option<PayloadSource>,
}

/// Totals from applying a substitution map.
#[must_use = "substitution result should be checked to verify what was changed"]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionResult {
    /// Entries whose payload was overwritten.
    pub entries_replaced: usize,
    /// Entries newly created by a substitution.
    pub entries_created: usize,
    /// Parent directories materialized along the way.
    pub directories_created: usize,
}

/// An ordered mapping from entry path to replacement payload.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    substitutions: Vec<Substitution>,
}

impl SubstitutionMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mappings, including `None`-source placeholders.
    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    /// Returns true if the map holds no mappings.
    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// Adds a mapping with an explicit (possibly absent) source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryPath`] if `path` fails validation.
    pub fn insert(&mut self, path: &str, source: Option<PayloadSource>) -> Result<()> {
        self.substitutions.push(Substitution {
            path: EntryPath::new(path)?,
            source,
        });
        Ok(())
    }

    /// Adds a mapping to inline replacement bytes.
    pub fn insert_bytes(&mut self, path: &str, bytes: Vec<u8>) -> Result<()> {
        self.insert(path, Some(PayloadSource::Bytes(bytes)))
    }

    /// Adds a mapping to a payload file on disk.
    pub fn insert_file(&mut self, path: &str, file: impl Into<PathBuf>) -> Result<()> {
        self.insert(path, Some(PayloadSource::File(file.into())))
    }

    /// Applies every mapping to `tree`, in declaration order.
    ///
    /// Mapped entries are overwritten or created, with missing parent
    /// directories materialized; a replaced entry keeps its permission bits.
    /// Replaced and created entries take the current time as their
    /// modification time.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a [`PayloadSource::File`] is missing.
    /// - [`Error::InvariantViolation`] if a target path is an existing
    ///   directory entry.
    /// - [`Error::Io`] if reading a payload file fails.
    pub fn apply(&self, tree: &mut FileTree) -> Result<SubstitutionResult> {
        let mut result = SubstitutionResult::default();

        for substitution in &self.substitutions {
            let Some(source) = &substitution.source else {
                continue;
            };
            let payload = match source {
                PayloadSource::Bytes(bytes) => bytes.clone(),
                PayloadSource::File(file) => {
                    fs::read(file).map_err(|e| Error::from_io_at(e, file))?
                }
            };

            let target = substitution.path.as_str();
            let previous_mode = match tree.get(target) {
                Some(existing) if existing.is_directory() => {
                    return Err(Error::InvariantViolation(format!(
                        "cannot substitute directory entry '{}'",
                        target
                    )));
                }
                Some(existing) => existing.unix_mode,
                None => None,
            };

            log::debug!("substituting '{}' ({} bytes)", target, payload.len());
            let mut entry =
                Entry::file(substitution.path.clone(), payload).with_modified(SystemTime::now());
            if let Some(mode) = previous_mode {
                entry = entry.with_unix_mode(mode);
            }

            let outcome = tree.insert(entry)?;
            result.directories_created += outcome.directories_created;
            if outcome.replaced {
                result.entries_replaced += 1;
            } else {
                result.entries_created += 1;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(entries: &[(&str, &[u8])]) -> FileTree {
        let mut tree = FileTree::new();
        for (path, payload) in entries {
            tree.insert(Entry::file(
                EntryPath::new(path).unwrap(),
                payload.to_vec(),
            ))
            .unwrap();
        }
        tree
    }

    #[test]
    fn test_replace_existing_entry() {
        let mut tree = tree_with(&[("textures/poster.png", b"old")]);
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("textures/poster.png", b"new".to_vec()).unwrap();

        let result = subs.apply(&mut tree).unwrap();
        assert_eq!(result.entries_replaced, 1);
        assert_eq!(result.entries_created, 0);
        assert_eq!(
            tree.get("textures/poster.png").unwrap().payload(),
            Some(&b"new"[..])
        );
    }

    #[test]
    fn test_create_missing_entry_and_parents() {
        let mut tree = tree_with(&[("root.usdc", b"scene")]);
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("textures/new/banner.png", b"pixels".to_vec())
            .unwrap();

        let result = subs.apply(&mut tree).unwrap();
        assert_eq!(result.entries_created, 1);
        assert_eq!(result.directories_created, 2);
        assert!(tree.get("textures").unwrap().is_directory());
        assert!(tree.get("textures/new").unwrap().is_directory());
    }

    #[test]
    fn test_untouched_entries_stay_identical() {
        let mut tree = tree_with(&[("root.usdc", b"scene"), ("textures/a.png", b"aa")]);
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("textures/b.png", b"bb".to_vec()).unwrap();

        subs.apply(&mut tree).unwrap();
        assert_eq!(tree.get("root.usdc").unwrap().payload(), Some(&b"scene"[..]));
        assert_eq!(tree.get("textures/a.png").unwrap().payload(), Some(&b"aa"[..]));
    }

    #[test]
    fn test_none_source_is_skipped() {
        let mut tree = tree_with(&[("textures/poster.png", b"old")]);
        let mut subs = SubstitutionMap::new();
        subs.insert("textures/poster.png", None).unwrap();

        let result = subs.apply(&mut tree).unwrap();
        assert_eq!(result, SubstitutionResult::default());
        assert_eq!(
            tree.get("textures/poster.png").unwrap().payload(),
            Some(&b"old"[..])
        );
    }

    #[test]
    fn test_duplicate_targets_last_wins() {
        let mut tree = FileTree::new();
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("poster.png", b"first".to_vec()).unwrap();
        subs.insert_bytes("poster.png", b"second".to_vec()).unwrap();

        let result = subs.apply(&mut tree).unwrap();
        assert_eq!(result.entries_created, 1);
        assert_eq!(result.entries_replaced, 1);
        assert_eq!(tree.get("poster.png").unwrap().payload(), Some(&b"second"[..]));
    }

    #[test]
    fn test_directory_target_rejected() {
        let mut tree = FileTree::new();
        tree.insert(Entry::directory(EntryPath::new("textures").unwrap()))
            .unwrap();
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("textures", b"not a dir".to_vec()).unwrap();

        let err = subs.apply(&mut tree).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn test_missing_payload_file() {
        let mut tree = FileTree::new();
        let mut subs = SubstitutionMap::new();
        subs.insert_file("poster.png", "/nonexistent/payload.png").unwrap();

        let err = subs.apply(&mut tree).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_payload_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.png");
        fs::write(&file, b"from disk").unwrap();

        let mut tree = FileTree::new();
        let mut subs = SubstitutionMap::new();
        subs.insert_file("textures/poster.png", &file).unwrap();

        let result = subs.apply(&mut tree).unwrap();
        assert_eq!(result.entries_created, 1);
        assert_eq!(
            tree.get("textures/poster.png").unwrap().payload(),
            Some(&b"from disk"[..])
        );
    }

    #[test]
    fn test_replacement_keeps_unix_mode() {
        let mut tree = FileTree::new();
        tree.insert(
            Entry::file(EntryPath::new("poster.png").unwrap(), b"old".to_vec())
                .with_unix_mode(0o600),
        )
        .unwrap();
        let mut subs = SubstitutionMap::new();
        subs.insert_bytes("poster.png", b"new".to_vec()).unwrap();

        subs.apply(&mut tree).unwrap();
        let entry = tree.get("poster.png").unwrap();
        assert_eq!(entry.unix_mode, Some(0o600));
        assert!(entry.modified.is_some());
    }

    #[test]
    fn test_invalid_target_path_rejected_at_insert() {
        let mut subs = SubstitutionMap::new();
        assert!(subs.insert_bytes("../escape.png", vec![]).is_err());
        assert!(subs.insert_bytes("/absolute.png", vec![]).is_err());
    }
}
