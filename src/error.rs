//! Error types for container operations.
//!
//! This module provides the [`Error`] enum covering every failure mode of
//! reading, transforming, and writing stage containers, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Handle
//! errors with the `?` operator or by matching on specific variants:
//!
//! ```rust,no_run
//! use stagepack::{read_container, Error};
//!
//! fn describe(path: &str) {
//!     match read_container(path) {
//!         Ok(tree) => println!("{} entries", tree.len()),
//!         Err(Error::NotFound { path }) => println!("missing: {}", path.display()),
//!         Err(Error::MalformedArchive(msg)) => println!("not a valid container: {}", msg),
//!         Err(e) => println!("error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Kinds
//!
//! Boundary layers (an HTTP handler, say) usually need a coarser
//! classification than the full enum. [`Error::kind`] folds every variant
//! into one of four [`ErrorKind`] values, so a caller can map each kind to a
//! distinct response without matching the whole enum.

use std::io;
use std::path::PathBuf;

/// The main error type for stage container operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading or writing bytes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required input file does not exist.
    ///
    /// Returned when the template container, or a substitution payload file,
    /// is missing from the filesystem.
    #[error("not found: {}", path.display())]
    NotFound {
        /// The path that could not be found.
        path: PathBuf,
    },

    /// The source container is structurally invalid.
    ///
    /// Covers a missing or damaged end-of-central-directory record,
    /// truncated headers, signature mismatches, and zip64 markers (inputs
    /// are bounded by contract, so zip64 is rejected rather than parsed).
    #[error("malformed container: {0}")]
    MalformedArchive(String),

    /// An entry's payload failed its integrity check on read.
    ///
    /// The stored CRC-32 did not match the checksum of the materialized
    /// payload bytes. The container was likely damaged in transit.
    #[error("CRC mismatch for entry '{name}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Entry name within the container.
        name: String,
        /// CRC-32 recorded in the central directory.
        expected: u32,
        /// CRC-32 computed over the materialized payload.
        actual: u32,
    },

    /// An entry uses a compression method this crate cannot decode.
    ///
    /// Only STORE and (with the `deflate` feature) DEFLATE are supported on
    /// read; the write side emits STORE exclusively.
    #[error("unsupported compression method {method} for entry '{name}'")]
    UnsupportedMethod {
        /// Entry name within the container.
        name: String,
        /// The method id found in the entry header.
        method: u16,
    },

    /// An entry path failed validation.
    ///
    /// Raised for paths that are absolute, contain `.`/`..` segments, NUL
    /// bytes, or empty segments, whether supplied by a caller or read from
    /// a container (where it indicates a hostile or corrupt archive).
    #[error("invalid entry path: {0}")]
    InvalidEntryPath(String),

    /// The writer cannot satisfy a structural invariant of the output.
    ///
    /// Raised when the stage entry is absent from the tree root, or when the
    /// serialized container would overflow the format's 32-bit size fields.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Coarse classification of an [`Error`] for boundary layers.
///
/// Each kind corresponds to one class of caller-visible outcome; the mapping
/// from kind to response lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input was missing.
    NotFound,
    /// The source container could not be decoded.
    MalformedArchive,
    /// The output could not be produced without breaking an invariant.
    InvariantViolation,
    /// Byte-level I/O failed.
    Io,
}

impl Error {
    /// Returns the coarse [`ErrorKind`] for this error.
    ///
    /// Integrity, method, and path failures all classify as
    /// [`ErrorKind::MalformedArchive`]: from the caller's point of view the
    /// source container could not be decoded, whatever the precise reason.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MalformedArchive(_)
            | Self::CrcMismatch { .. }
            | Self::UnsupportedMethod { .. }
            | Self::InvalidEntryPath(_) => ErrorKind::MalformedArchive,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Maps an I/O error on `path` to [`Error::NotFound`] when the underlying
    /// cause is a missing file, and to [`Error::Io`] otherwise.
    pub(crate) fn from_io_at(err: io::Error, path: &std::path::Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

/// A specialized `Result` type for stage container operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_kind_not_found() {
        let err = Error::NotFound {
            path: PathBuf::from("template.usdz"),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("template.usdz"));
    }

    #[test]
    fn test_kind_malformed_variants() {
        let malformed = [
            Error::MalformedArchive("no end-of-central-directory record".into()),
            Error::CrcMismatch {
                name: "a.png".into(),
                expected: 1,
                actual: 2,
            },
            Error::UnsupportedMethod {
                name: "a.png".into(),
                method: 12,
            },
            Error::InvalidEntryPath("../escape".into()),
        ];
        for err in malformed {
            assert_eq!(err.kind(), ErrorKind::MalformedArchive);
        }
    }

    #[test]
    fn test_kind_invariant() {
        let err = Error::InvariantViolation("stage entry missing".into());
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_from_io_at_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = Error::from_io_at(io_err, std::path::Path::new("x/y.usdz"));
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_from_io_at_other() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from_io_at(io_err, std::path::Path::new("x/y.usdz"));
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_crc_mismatch_display() {
        let err = Error::CrcMismatch {
            name: "textures/poster.png".into(),
            expected: 0xDEADBEEF,
            actual: 0x12345678,
        };
        let msg = err.to_string();
        assert!(msg.contains("textures/poster.png"));
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0x12345678"));
    }
}
