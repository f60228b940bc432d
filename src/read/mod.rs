//! Reading stage containers into a file tree.
//!
//! [`Archive`] decodes an existing container: it parses the central
//! directory, materializes every payload (decoding DEFLATE-stored entries
//! when the `deflate` feature is enabled), verifies each payload against its
//! stored CRC-32, and produces a [`FileTree`](crate::FileTree) with explicit
//! directory entries for every path prefix.
//!
//! Reads are independent per invocation: there is no shared cache and no
//! cross-request state.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagepack::read_container;
//!
//! # fn main() -> stagepack::Result<()> {
//! let tree = read_container("template.usdz")?;
//! for path in tree.paths() {
//!     println!("{}", path);
//! }
//! # Ok(())
//! # }
//! ```

mod archive;

pub use archive::{Archive, read_container};
