//! Container serialization.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::checksum::digest;
use crate::format::header::{CentralFileHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::format::{
    DOS_ATTR_DIRECTORY, FLAG_UTF8, METHOD_STORE, VERSION_MADE_BY_UNIX, ZIP64_SENTINEL_U16,
};
use crate::timestamp::DosDateTime;
use crate::tree::{Entry, FileTree};
use crate::{Error, Result};

/// Default permission bits for entries that carry none.
const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Unix file-type bits carried in the external attributes.
const S_IFREG: u32 = 0o100_000;
const S_IFDIR: u32 = 0o040_000;

/// Result of writing a container.
#[must_use = "write result should be checked to verify what was written"]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directory entries written.
    pub directories_written: usize,
    /// Total size of the serialized container in bytes.
    pub total_bytes: u64,
}

/// Serializes `tree` into container bytes.
///
/// `stage_entry_name` names the root scene-description entry that must
/// appear first; it is required whenever the tree is non-empty.
///
/// # Errors
///
/// Returns [`Error::InvariantViolation`] when the stage entry is missing,
/// not a root-level file, or the container would overflow the format's
/// 32-bit size and offset fields.
pub fn serialize_container(tree: &FileTree, stage_entry_name: &str) -> Result<(Vec<u8>, WriteResult)> {
    if !tree.is_empty() {
        validate_stage_entry(tree, stage_entry_name)?;
    }

    let mut ordered = Vec::with_capacity(tree.len());
    collect_ordered(tree, "", Some(stage_entry_name), &mut ordered);

    let mut data = Vec::new();
    let mut centrals = Vec::with_capacity(ordered.len());
    let mut result = WriteResult::default();

    for entry in &ordered {
        let offset = u32::try_from(data.len()).map_err(|_| {
            Error::InvariantViolation("container exceeds the 4 GiB offset limit".into())
        })?;

        let (name, payload): (String, &[u8]) = match entry.payload() {
            Some(payload) => (entry.path.as_str().to_string(), payload),
            None => (format!("{}/", entry.path), &[]),
        };
        // Size and checksum always come from the bytes about to be written.
        let (size, crc32) = digest(payload);
        let size = u32::try_from(size).map_err(|_| {
            Error::InvariantViolation(format!(
                "entry '{}' exceeds the 4 GiB size limit",
                entry.path
            ))
        })?;

        let flags = if name.is_ascii() { 0 } else { FLAG_UTF8 };
        let timestamp = entry
            .modified
            .map(DosDateTime::from_system_time)
            .unwrap_or_default();

        let local = LocalFileHeader {
            flags,
            method: METHOD_STORE,
            mod_time: timestamp.time(),
            mod_date: timestamp.date(),
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            name: name.clone().into_bytes(),
            extra_len: 0,
        };
        local.write_to(&mut data)?;
        data.extend_from_slice(payload);

        centrals.push(CentralFileHeader {
            version_made_by: VERSION_MADE_BY_UNIX,
            flags,
            method: METHOD_STORE,
            mod_time: timestamp.time(),
            mod_date: timestamp.date(),
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            external_attrs: external_attrs(entry),
            local_header_offset: offset,
            name: name.into_bytes(),
        });

        if entry.is_directory() {
            result.directories_written += 1;
        } else {
            result.entries_written += 1;
        }
    }

    let directory_offset = u32::try_from(data.len()).map_err(|_| {
        Error::InvariantViolation("container exceeds the 4 GiB offset limit".into())
    })?;
    for central in &centrals {
        central.write_to(&mut data)?;
    }
    let directory_end = u32::try_from(data.len()).map_err(|_| {
        Error::InvariantViolation("container exceeds the 4 GiB offset limit".into())
    })?;
    let directory_size = directory_end - directory_offset;

    if centrals.len() >= ZIP64_SENTINEL_U16 as usize {
        return Err(Error::InvariantViolation(format!(
            "container holds {} entries, above the format's 16-bit limit",
            centrals.len()
        )));
    }
    let end = EndOfCentralDirectory {
        entry_count: centrals.len() as u16,
        directory_size,
        directory_offset,
    };
    end.write_to(&mut data)?;

    result.total_bytes = data.len() as u64;
    Ok((data, result))
}

/// Serializes `tree` and writes it atomically to `destination`.
///
/// The bytes go to a uniquely named temp file in the destination's parent
/// directory (created if absent) and are renamed into place only after a
/// complete, flushed write. On any failure the temp file is discarded and
/// the destination is never observed half-written.
pub fn write_container(
    tree: &FileTree,
    stage_entry_name: &str,
    destination: impl AsRef<Path>,
) -> Result<WriteResult> {
    let destination = destination.as_ref();
    let (data, result) = serialize_container(tree, stage_entry_name)?;

    let parent = destination.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }
    let mut temp = match parent {
        Some(parent) => tempfile::NamedTempFile::new_in(parent)?,
        None => tempfile::NamedTempFile::new()?,
    };
    temp.write_all(&data)?;
    temp.flush()?;
    temp.persist(destination).map_err(|e| Error::Io(e.error))?;

    log::debug!(
        "wrote container '{}': {} files, {} directories, {} bytes",
        destination.display(),
        result.entries_written,
        result.directories_written,
        result.total_bytes
    );
    Ok(result)
}

/// Checks that the stage entry is a root-level file of the tree.
fn validate_stage_entry(tree: &FileTree, stage_entry_name: &str) -> Result<()> {
    if stage_entry_name.is_empty() || stage_entry_name.contains('/') {
        return Err(Error::InvariantViolation(format!(
            "stage entry name '{}' is not a root-level name",
            stage_entry_name
        )));
    }
    match tree.get(stage_entry_name) {
        Some(entry) if entry.is_file() => Ok(()),
        Some(_) => Err(Error::InvariantViolation(format!(
            "stage entry '{}' is a directory",
            stage_entry_name
        ))),
        None => Err(Error::InvariantViolation(format!(
            "stage entry '{}' not found in tree",
            stage_entry_name
        ))),
    }
}

/// Sort key for one sibling: `(tier, name)`.
///
/// `stage` is `Some` only at the tree root, where the stage entry takes the
/// first tier, remaining directories the second, remaining files the third.
/// Below the root every sibling shares one tier, so ordering is purely
/// lexicographic.
fn sort_key<'e>(entry: &'e Entry, stage: Option<&str>) -> (u8, &'e str) {
    let name = entry.name();
    let tier = match stage {
        Some(stage) if name == stage => 0,
        Some(_) if entry.is_directory() => 1,
        Some(_) => 2,
        None => 0,
    };
    (tier, name)
}

/// Appends the entries under `parent` to `out`, pre-order, siblings sorted
/// by their [`sort_key`].
fn collect_ordered<'t>(
    tree: &'t FileTree,
    parent: &str,
    stage: Option<&str>,
    out: &mut Vec<&'t Entry>,
) {
    let mut keyed: Vec<((u8, &str), &Entry)> = tree
        .children(parent)
        .into_iter()
        .map(|entry| (sort_key(entry, stage), entry))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    for (_, entry) in keyed {
        out.push(entry);
        if entry.is_directory() {
            collect_ordered(tree, entry.path.as_str(), None, out);
        }
    }
}

/// External attributes: unix mode in the upper word, DOS directory bit for
/// directory entries.
fn external_attrs(entry: &Entry) -> u32 {
    if entry.is_directory() {
        let mode = entry.unix_mode.unwrap_or(DEFAULT_DIR_MODE);
        ((S_IFDIR | mode) << 16) | DOS_ATTR_DIRECTORY
    } else {
        let mode = entry.unix_mode.unwrap_or(DEFAULT_FILE_MODE);
        (S_IFREG | mode) << 16
    }
}
