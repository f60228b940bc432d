//! Container decoding.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::checksum::Crc32;
use crate::format::header::{CentralFileHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::format::io::find_end_of_central_directory;
use crate::format::{FLAG_ENCRYPTED, LOCAL_FILE_HEADER_SIZE, METHOD_DEFLATE, METHOD_STORE};
use crate::timestamp::DosDateTime;
use crate::tree::{Entry, FileTree};
use crate::{EntryPath, Error, Result};

/// Reads the container at `path` into a [`FileTree`].
///
/// Convenience for [`Archive::open_path`] followed by
/// [`Archive::into_tree`].
pub fn read_container(path: impl AsRef<Path>) -> Result<FileTree> {
    Archive::open_path(path)?.into_tree()
}

/// An opened container with its central directory parsed.
///
/// Payloads are not touched until [`into_tree`](Self::into_tree) runs; an
/// `Archive` can be inspected cheaply before committing to materialization.
#[derive(Debug)]
pub struct Archive {
    data: Vec<u8>,
    headers: Vec<CentralFileHeader>,
}

impl Archive {
    /// Opens a container file and parses its central directory.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` does not exist.
    /// - [`Error::MalformedArchive`] if the end record or central directory
    ///   cannot be decoded.
    /// - [`Error::Io`] for any other filesystem failure.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::from_io_at(e, path))?;
        Self::from_bytes(data)
    }

    /// Parses a container already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let end_pos = find_end_of_central_directory(&data).ok_or_else(|| {
            Error::MalformedArchive("no end-of-central-directory record found".into())
        })?;
        let end = EndOfCentralDirectory::parse(&mut Cursor::new(&data[end_pos..]))?;

        let dir_start = end.directory_offset as usize;
        let dir_end = dir_start
            .checked_add(end.directory_size as usize)
            .filter(|&e| e <= end_pos)
            .ok_or_else(|| {
                Error::MalformedArchive("central directory extends past end record".into())
            })?;

        let mut cursor = Cursor::new(&data[dir_start..dir_end]);
        let mut headers = Vec::with_capacity(end.entry_count as usize);
        for _ in 0..end.entry_count {
            headers.push(
                CentralFileHeader::parse(&mut cursor)
                    .map_err(|e| map_truncated(e, "central directory"))?,
            );
        }
        log::debug!("parsed central directory: {} entries", headers.len());

        Ok(Self { data, headers })
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Materializes every entry into a [`FileTree`].
    ///
    /// File payloads are fully decoded and CRC-verified; directory entries
    /// become explicit tree nodes, as do any implicit path prefixes.
    pub fn into_tree(self) -> Result<FileTree> {
        let mut tree = FileTree::new();

        for header in &self.headers {
            let raw_name = header.name_str()?;
            let (path, name_is_dir) = EntryPath::from_entry_name(raw_name)?;
            let modified = DosDateTime::from_parts(header.mod_date, header.mod_time).to_system_time();

            let entry = if name_is_dir {
                if header.uncompressed_size != 0 {
                    return Err(Error::MalformedArchive(format!(
                        "directory entry '{}' carries a payload",
                        raw_name
                    )));
                }
                Entry::directory(path)
            } else {
                let payload = self.read_payload(header, raw_name)?;
                Entry::file(path, payload)
            };

            let entry = entry.with_modified(modified);
            let entry = match unix_mode_of(header) {
                Some(mode) => entry.with_unix_mode(mode),
                None => entry,
            };

            // A kind collision between entries is the source container
            // contradicting itself, not a pipeline bug.
            tree.insert(entry).map_err(|e| match e {
                Error::InvariantViolation(msg) => Error::MalformedArchive(msg),
                other => other,
            })?;
        }

        Ok(tree)
    }

    /// Locates and decodes one entry's payload bytes.
    fn read_payload(&self, header: &CentralFileHeader, name: &str) -> Result<Vec<u8>> {
        let offset = header.local_header_offset as usize;
        if offset + LOCAL_FILE_HEADER_SIZE > self.data.len() {
            return Err(Error::MalformedArchive(format!(
                "local header offset {:#x} for entry '{}' is out of bounds",
                offset, name
            )));
        }

        let local = LocalFileHeader::parse(&mut Cursor::new(&self.data[offset..]))
            .map_err(|e| map_truncated(e, "local file header"))?;
        if local.flags & FLAG_ENCRYPTED != 0 {
            return Err(Error::MalformedArchive(format!(
                "entry '{}' is encrypted",
                name
            )));
        }

        let data_start =
            offset + LOCAL_FILE_HEADER_SIZE + local.name.len() + local.extra_len as usize;
        // Sizes come from the central directory: when the entry was written
        // in streaming mode the local header holds zeros.
        let data_end = data_start
            .checked_add(header.compressed_size as usize)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| {
                Error::MalformedArchive(format!(
                    "payload of entry '{}' extends past end of container",
                    name
                ))
            })?;
        let raw = &self.data[data_start..data_end];

        let payload = match header.method {
            METHOD_STORE => raw.to_vec(),
            METHOD_DEFLATE => inflate(raw, header.uncompressed_size, name)?,
            method => {
                return Err(Error::UnsupportedMethod {
                    name: name.to_string(),
                    method,
                });
            }
        };

        if payload.len() as u64 != u64::from(header.uncompressed_size) {
            return Err(Error::MalformedArchive(format!(
                "entry '{}' decoded to {} bytes, header claims {}",
                name,
                payload.len(),
                header.uncompressed_size
            )));
        }
        let actual = Crc32::compute(&payload);
        if actual != header.crc32 {
            return Err(Error::CrcMismatch {
                name: name.to_string(),
                expected: header.crc32,
                actual,
            });
        }

        Ok(payload)
    }
}

/// Reclassifies an end-of-input I/O failure as a malformed container.
///
/// Record parsing reads from an in-memory slice, so running out of bytes
/// means the container is truncated, not that the filesystem failed.
fn map_truncated(err: Error, what: &str) -> Error {
    match err {
        Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::MalformedArchive(format!("truncated {}", what))
        }
        other => other,
    }
}

/// Extracts unix permission bits from a unix-host central header.
fn unix_mode_of(header: &CentralFileHeader) -> Option<u32> {
    if header.version_made_by >> 8 != 3 {
        return None;
    }
    let mode = (header.external_attrs >> 16) & 0o7777;
    (mode != 0).then_some(mode)
}

#[cfg(feature = "deflate")]
fn inflate(raw: &[u8], expected_len: u32, name: &str) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut decoder = flate2::read::DeflateDecoder::new(raw);
    // Capacity from the header claim, capped so a corrupt size field cannot
    // force a huge allocation before a single byte is decoded.
    let mut payload = Vec::with_capacity((expected_len as usize).min(1 << 20));
    decoder.read_to_end(&mut payload).map_err(|e| {
        Error::MalformedArchive(format!("failed to inflate entry '{}': {}", name, e))
    })?;
    Ok(payload)
}

#[cfg(not(feature = "deflate"))]
fn inflate(_raw: &[u8], _expected_len: u32, name: &str) -> Result<Vec<u8>> {
    Err(Error::UnsupportedMethod {
        name: name.to_string(),
        method: METHOD_DEFLATE,
    })
}
