//! Checksum computation utilities.
//!
//! CRC-32 (IEEE 802.3 polynomial) is the per-entry integrity value of the
//! container format. The writer computes every entry's checksum from the
//! final payload bytes through [`digest`]; the reader verifies materialized
//! payloads against the stored value with the same function.
//!
//! # Example
//!
//! ```rust
//! use stagepack::checksum::{Crc32, digest};
//!
//! // Incremental computation
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), 0xEC4AC3D0);
//!
//! // Size and checksum of a payload in one call
//! let (size, crc) = digest(b"Hello, World!");
//! assert_eq!(size, 13);
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

/// CRC-32 checksum calculator.
///
/// Uses the IEEE 802.3 polynomial, the checksum format stored in container
/// entry headers.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new CRC-32 calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of the data fed so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Returns the `(size, crc32)` pair of a payload.
///
/// This is the single integrity function the writer applies uniformly to
/// every entry at serialization time. Sizes and checksums are never carried
/// forward from source metadata, so an entry replaced upstream can never
/// ship a stale digest.
pub fn digest(payload: &[u8]) -> (u64, u32) {
    (payload.len() as u64, Crc32::compute(payload))
}
