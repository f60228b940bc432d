//! Fixed-layout container records: local headers, central directory, end record.
//!
//! Each record type knows how to parse itself from a reader and emit itself
//! to a writer. Multi-byte fields are little-endian throughout. Parsing
//! validates signatures and rejects zip64 sentinel values; everything else
//! is the caller's concern.

use std::io::{self, Read, Write};

use super::io::{read_bytes, read_u16_le, read_u32_le};
use super::{
    CENTRAL_FILE_HEADER_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIGNATURE,
    LOCAL_FILE_HEADER_SIGNATURE, ZIP64_SENTINEL_U16, ZIP64_SENTINEL_U32,
};
use crate::{Error, Result};

/// A local file header, written immediately before each entry's payload.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    /// General-purpose flag bits.
    pub flags: u16,
    /// Storage method id.
    pub method: u16,
    /// Modification time, DOS format.
    pub mod_time: u16,
    /// Modification date, DOS format.
    pub mod_date: u16,
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Payload size as stored.
    pub compressed_size: u32,
    /// Payload size after decoding.
    pub uncompressed_size: u32,
    /// Raw entry name bytes.
    pub name: Vec<u8>,
    /// Length of the extra field following the name (not retained).
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// Parses a local file header, signature included.
    ///
    /// The extra field is skipped; only its length is retained so the caller
    /// can locate the payload that follows.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let signature = read_u32_le(r)?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(Error::MalformedArchive(format!(
                "expected local file header signature, got {:#010x}",
                signature
            )));
        }
        let _version_needed = read_u16_le(r)?;
        let flags = read_u16_le(r)?;
        let method = read_u16_le(r)?;
        let mod_time = read_u16_le(r)?;
        let mod_date = read_u16_le(r)?;
        let crc32 = read_u32_le(r)?;
        let compressed_size = read_u32_le(r)?;
        let uncompressed_size = read_u32_le(r)?;
        let name_len = read_u16_le(r)?;
        let extra_len = read_u16_le(r)?;
        let name = read_bytes(r, name_len as usize)?;

        Ok(Self {
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            name,
            extra_len,
        })
    }

    /// Writes the header, signature and name included.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes())?;
        w.write_all(&super::VERSION_NEEDED.to_le_bytes())?;
        w.write_all(&self.flags.to_le_bytes())?;
        w.write_all(&self.method.to_le_bytes())?;
        w.write_all(&self.mod_time.to_le_bytes())?;
        w.write_all(&self.mod_date.to_le_bytes())?;
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&self.compressed_size.to_le_bytes())?;
        w.write_all(&self.uncompressed_size.to_le_bytes())?;
        w.write_all(&(self.name.len() as u16).to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?; // extra field length
        w.write_all(&self.name)?;
        Ok(())
    }

    /// Total serialized size of this header in bytes.
    pub fn size(&self) -> u64 {
        super::LOCAL_FILE_HEADER_SIZE as u64 + self.name.len() as u64
    }
}

/// A central directory file header, one per entry.
#[derive(Debug, Clone)]
pub struct CentralFileHeader {
    /// Host and format version that produced the entry.
    pub version_made_by: u16,
    /// General-purpose flag bits.
    pub flags: u16,
    /// Storage method id.
    pub method: u16,
    /// Modification time, DOS format.
    pub mod_time: u16,
    /// Modification date, DOS format.
    pub mod_date: u16,
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Payload size as stored.
    pub compressed_size: u32,
    /// Payload size after decoding.
    pub uncompressed_size: u32,
    /// External attributes (host-specific; unix mode in the upper word).
    pub external_attrs: u32,
    /// Byte offset of the entry's local file header.
    pub local_header_offset: u32,
    /// Raw entry name bytes.
    pub name: Vec<u8>,
}

impl CentralFileHeader {
    /// Parses a central directory header, signature included.
    ///
    /// Extra field and comment are skipped. zip64 sentinel sizes or offsets
    /// are rejected: bounded inputs never need them, so their presence means
    /// the container is out of contract.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let signature = read_u32_le(r)?;
        if signature != CENTRAL_FILE_HEADER_SIGNATURE {
            return Err(Error::MalformedArchive(format!(
                "expected central directory signature, got {:#010x}",
                signature
            )));
        }
        let version_made_by = read_u16_le(r)?;
        let _version_needed = read_u16_le(r)?;
        let flags = read_u16_le(r)?;
        let method = read_u16_le(r)?;
        let mod_time = read_u16_le(r)?;
        let mod_date = read_u16_le(r)?;
        let crc32 = read_u32_le(r)?;
        let compressed_size = read_u32_le(r)?;
        let uncompressed_size = read_u32_le(r)?;
        let name_len = read_u16_le(r)?;
        let extra_len = read_u16_le(r)?;
        let comment_len = read_u16_le(r)?;
        let _disk_start = read_u16_le(r)?;
        let _internal_attrs = read_u16_le(r)?;
        let external_attrs = read_u32_le(r)?;
        let local_header_offset = read_u32_le(r)?;
        let name = read_bytes(r, name_len as usize)?;
        // Skip extra field and comment.
        read_bytes(r, extra_len as usize + comment_len as usize)?;

        if compressed_size == ZIP64_SENTINEL_U32
            || uncompressed_size == ZIP64_SENTINEL_U32
            || local_header_offset == ZIP64_SENTINEL_U32
        {
            return Err(Error::MalformedArchive(
                "zip64 entry fields are not supported".into(),
            ));
        }

        Ok(Self {
            version_made_by,
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            external_attrs,
            local_header_offset,
            name,
        })
    }

    /// Writes the header, signature and name included.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&CENTRAL_FILE_HEADER_SIGNATURE.to_le_bytes())?;
        w.write_all(&self.version_made_by.to_le_bytes())?;
        w.write_all(&super::VERSION_NEEDED.to_le_bytes())?;
        w.write_all(&self.flags.to_le_bytes())?;
        w.write_all(&self.method.to_le_bytes())?;
        w.write_all(&self.mod_time.to_le_bytes())?;
        w.write_all(&self.mod_date.to_le_bytes())?;
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&self.compressed_size.to_le_bytes())?;
        w.write_all(&self.uncompressed_size.to_le_bytes())?;
        w.write_all(&(self.name.len() as u16).to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?; // extra field length
        w.write_all(&0u16.to_le_bytes())?; // comment length
        w.write_all(&0u16.to_le_bytes())?; // disk number start
        w.write_all(&0u16.to_le_bytes())?; // internal attributes
        w.write_all(&self.external_attrs.to_le_bytes())?;
        w.write_all(&self.local_header_offset.to_le_bytes())?;
        w.write_all(&self.name)?;
        Ok(())
    }

    /// Total serialized size of this header in bytes.
    pub fn size(&self) -> u64 {
        super::CENTRAL_FILE_HEADER_SIZE as u64 + self.name.len() as u64
    }

    /// Decodes the entry name as UTF-8.
    ///
    /// Stage templates are produced by modern tooling, so names are required
    /// to be valid UTF-8 regardless of the UTF-8 flag bit.
    pub fn name_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.name).map_err(|_| {
            Error::MalformedArchive(format!(
                "entry name is not valid UTF-8: {:?}",
                String::from_utf8_lossy(&self.name)
            ))
        })
    }
}

/// The end-of-central-directory record closing the container.
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory {
    /// Number of central directory entries.
    pub entry_count: u16,
    /// Size in bytes of the central directory.
    pub directory_size: u32,
    /// Byte offset of the first central directory header.
    pub directory_offset: u32,
}

impl EndOfCentralDirectory {
    /// Parses the end record, signature included.
    ///
    /// Multi-disk containers and zip64 sentinel counts are rejected.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let signature = read_u32_le(r)?;
        if signature != END_OF_CENTRAL_DIRECTORY_SIGNATURE {
            return Err(Error::MalformedArchive(format!(
                "expected end-of-central-directory signature, got {:#010x}",
                signature
            )));
        }
        let disk_number = read_u16_le(r)?;
        let directory_disk = read_u16_le(r)?;
        let entries_on_disk = read_u16_le(r)?;
        let entry_count = read_u16_le(r)?;
        let directory_size = read_u32_le(r)?;
        let directory_offset = read_u32_le(r)?;
        let _comment_len = read_u16_le(r)?;

        if disk_number != 0 || directory_disk != 0 || entries_on_disk != entry_count {
            return Err(Error::MalformedArchive(
                "multi-disk containers are not supported".into(),
            ));
        }
        if entry_count == ZIP64_SENTINEL_U16
            || directory_size == ZIP64_SENTINEL_U32
            || directory_offset == ZIP64_SENTINEL_U32
        {
            return Err(Error::MalformedArchive(
                "zip64 end record is not supported".into(),
            ));
        }

        Ok(Self {
            entry_count,
            directory_size,
            directory_offset,
        })
    }

    /// Writes the end record with an empty comment.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?; // disk number
        w.write_all(&0u16.to_le_bytes())?; // directory start disk
        w.write_all(&self.entry_count.to_le_bytes())?;
        w.write_all(&self.entry_count.to_le_bytes())?;
        w.write_all(&self.directory_size.to_le_bytes())?;
        w.write_all(&self.directory_offset.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?; // comment length
        Ok(())
    }
}
