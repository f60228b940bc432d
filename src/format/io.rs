//! Low-level binary reading utilities for container parsing.

use std::io::{self, Read};

/// Reads a little-endian `u16` from a reader.
pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads a little-endian `u32` from a reader.
pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads exactly `len` bytes into a fresh buffer.
pub fn read_bytes<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Locates the end-of-central-directory record in `data`.
///
/// The record sits at the very end of the container, followed only by an
/// optional comment of up to 64 KiB, so the search scans backwards over that
/// window for the record signature. Returns the record's byte offset, or
/// `None` if no signature is found.
pub fn find_end_of_central_directory(data: &[u8]) -> Option<usize> {
    use super::{END_OF_CENTRAL_DIRECTORY_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, MAX_COMMENT_LENGTH};

    if data.len() < END_OF_CENTRAL_DIRECTORY_SIZE {
        return None;
    }
    let earliest = data
        .len()
        .saturating_sub(END_OF_CENTRAL_DIRECTORY_SIZE + MAX_COMMENT_LENGTH);
    let latest = data.len() - END_OF_CENTRAL_DIRECTORY_SIZE;

    (earliest..=latest).rev().find(|&pos| {
        u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            == END_OF_CENTRAL_DIRECTORY_SIGNATURE
    })
}
