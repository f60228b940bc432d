//! Shared helpers for integration tests: container fixture builders and
//! raw-byte inspection of written output.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use stagepack::checksum::Crc32;
use stagepack::format::header::{CentralFileHeader, EndOfCentralDirectory, LocalFileHeader};
use stagepack::format::{
    LOCAL_FILE_HEADER_SIGNATURE, METHOD_DEFLATE, METHOD_STORE, VERSION_MADE_BY_UNIX,
};

/// One entry of a hand-built fixture container.
pub struct FixtureEntry {
    pub name: String,
    pub payload: Vec<u8>,
    pub deflate: bool,
    /// When set, the headers carry this CRC instead of the real one.
    pub crc_override: Option<u32>,
}

/// A STORE-encoded file entry.
pub fn stored(name: &str, payload: &[u8]) -> FixtureEntry {
    FixtureEntry {
        name: name.to_string(),
        payload: payload.to_vec(),
        deflate: false,
        crc_override: None,
    }
}

/// A DEFLATE-encoded file entry.
pub fn deflated(name: &str, payload: &[u8]) -> FixtureEntry {
    FixtureEntry {
        name: name.to_string(),
        payload: payload.to_vec(),
        deflate: true,
        crc_override: None,
    }
}

/// An explicit directory entry (trailing-slash name, empty payload).
pub fn directory(name: &str) -> FixtureEntry {
    FixtureEntry {
        name: format!("{}/", name.trim_end_matches('/')),
        payload: Vec::new(),
        deflate: false,
        crc_override: None,
    }
}

/// Builds fixture container bytes from `entries`, in the given order.
///
/// This builder is deliberately independent of the crate's writer: it emits
/// whatever it is told, including compressed entries, arbitrary ordering,
/// hostile names, and wrong checksums, so tests can exercise the reader
/// against containers the writer would never produce.
pub fn build_container(entries: &[FixtureEntry]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut centrals = Vec::new();

    for entry in entries {
        let offset = data.len() as u32;
        let crc32 = entry
            .crc_override
            .unwrap_or_else(|| Crc32::compute(&entry.payload));
        let (method, stored_bytes) = if entry.deflate {
            (METHOD_DEFLATE, deflate_bytes(&entry.payload))
        } else {
            (METHOD_STORE, entry.payload.clone())
        };

        let local = LocalFileHeader {
            flags: 0,
            method,
            mod_time: 0,
            mod_date: (1 << 5) | 1, // 1980-01-01
            crc32,
            compressed_size: stored_bytes.len() as u32,
            uncompressed_size: entry.payload.len() as u32,
            name: entry.name.as_bytes().to_vec(),
            extra_len: 0,
        };
        local.write_to(&mut data).unwrap();
        data.extend_from_slice(&stored_bytes);

        centrals.push(CentralFileHeader {
            version_made_by: VERSION_MADE_BY_UNIX,
            flags: 0,
            method,
            mod_time: 0,
            mod_date: (1 << 5) | 1,
            crc32,
            compressed_size: stored_bytes.len() as u32,
            uncompressed_size: entry.payload.len() as u32,
            external_attrs: 0o644 << 16,
            local_header_offset: offset,
            name: entry.name.as_bytes().to_vec(),
        });
    }

    let directory_offset = data.len() as u32;
    for central in &centrals {
        central.write_to(&mut data).unwrap();
    }
    let end = EndOfCentralDirectory {
        entry_count: centrals.len() as u16,
        directory_size: data.len() as u32 - directory_offset,
        directory_offset,
    };
    end.write_to(&mut data).unwrap();
    data
}

/// Writes fixture bytes into `dir` under `name` and returns the path.
pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// One local-header record pulled back out of written container bytes.
#[derive(Debug)]
pub struct RawLocalEntry {
    pub name: String,
    pub method: u16,
    pub crc32: u32,
    pub payload: Vec<u8>,
}

/// Walks the local-header sequence of a container, in on-disk order.
///
/// Inspection stays at the byte level on purpose: assertions about entry
/// order and storage method must hold for any consumer, not just this
/// crate's own reader.
pub fn local_entries(data: &[u8]) -> Vec<RawLocalEntry> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset + 4 <= data.len() {
        let signature = u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            break;
        }
        let header = LocalFileHeader::parse(&mut Cursor::new(&data[offset..])).unwrap();
        let data_start = offset + 30 + header.name.len() + header.extra_len as usize;
        let data_end = data_start + header.compressed_size as usize;
        entries.push(RawLocalEntry {
            name: String::from_utf8(header.name.clone()).unwrap(),
            method: header.method,
            crc32: header.crc32,
            payload: data[data_start..data_end].to_vec(),
        });
        offset = data_end;
    }

    entries
}

fn deflate_bytes(payload: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}
