//! Deterministic serialization of a file tree into a stage container.
//!
//! The writer holds the two invariants the consuming viewer depends on:
//!
//! - **Storage**: every entry is written with the STORE method. Compressed
//!   entries in a stage container are a correctness bug, not a size
//!   trade-off, so the write side has no compression path at all.
//! - **Ordering**: at the tree root, the stage entry sorts first, remaining
//!   directories before remaining files, lexicographic within each tier;
//!   below the root, siblings sort purely lexicographically. Directories are
//!   written pre-order, ahead of their descendants.
//!
//! Sizes and CRC-32 checksums are computed from the final payload bytes of
//! every entry at write time, never carried forward from source metadata,
//! and output lands at the destination atomically (temp file, then rename),
//! so a failed write never leaves a partial container behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagepack::{write_container, FileTree};
//!
//! # fn main() -> stagepack::Result<()> {
//! # let tree = FileTree::new();
//! let result = write_container(&tree, "root.usdc", "out/stage.usdz")?;
//! println!("{} entries, {} bytes", result.entries_written, result.total_bytes);
//! # Ok(())
//! # }
//! ```

mod writer;

pub use writer::{WriteResult, serialize_container, write_container};
