//! # stagepack
//!
//! A pure-Rust library for assembling AR stage containers.
//!
//! A stage container is a zip-structured package holding a 3D scene: a root
//! scene-description entry plus its textures and auxiliary files. The
//! consuming viewer imposes two structural constraints a generic zip tool
//! will not keep for you: the scene-description entry must be the first
//! entry of the archive, and every entry must be stored without compression.
//! This crate rebuilds such containers (read a template, swap texture
//! payloads, re-serialize deterministically) while holding both invariants.
//!
//! ## Assembling a container
//!
//! ```rust,no_run
//! use stagepack::{assemble_container, SubstitutionMap, TemplateDescriptor, Variant};
//!
//! fn main() -> stagepack::Result<()> {
//!     let descriptor = TemplateDescriptor::new(Variant::A, "stage_a.usdz", "root.usdc");
//!
//!     let mut substitutions = SubstitutionMap::new();
//!     substitutions.insert_bytes("textures/poster.png", b"png bytes".to_vec())?;
//!
//!     assemble_container(
//!         descriptor.resolve_in("templates"),
//!         &substitutions,
//!         &descriptor,
//!         "out/stage.usdz",
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ## Selecting a template variant
//!
//! Requests carry free-text labels; the selector counts them against two
//! category sets and resolves the majority to a template, breaking ties
//! uniformly at random:
//!
//! ```rust
//! use stagepack::{TemplateDescriptor, Variant, VariantSelector};
//!
//! fn main() -> stagepack::Result<()> {
//!     let selector = VariantSelector::new(
//!         ["hero", "knight"],
//!         TemplateDescriptor::new(Variant::A, "stage_a.usdz", "root.usdc"),
//!         ["villain", "rogue"],
//!         TemplateDescriptor::new(Variant::B, "stage_b.usdz", "root.usdc"),
//!     )?;
//!     let descriptor = selector.select(["Hero", "knight", "rogue"]);
//!     assert_eq!(descriptor.variant, Variant::A);
//!     Ok(())
//! }
//! ```
//!
//! ## Working with the pieces
//!
//! The pipeline stages are exposed individually: [`read_container`] (or
//! [`Archive`]) decodes a container into a [`FileTree`], a
//! [`SubstitutionMap`] mutates the tree, and [`write_container`] serializes
//! it. Each invocation owns its tree outright, so concurrent requests need
//! no synchronization.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error::kind`] folds the variants into
//! a four-way [`ErrorKind`] taxonomy for boundary layers that map error
//! classes to responses.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Decode DEFLATE-stored entries in source containers |
//!
//! The write side always emits STORE; disabling `deflate` only restricts
//! which source containers can be read.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod checksum;
pub mod entry_path;
pub mod error;
pub mod format;
pub mod read;
pub mod substitute;
pub mod timestamp;
pub mod tree;
pub mod variant;
pub mod write;

pub use entry_path::EntryPath;
pub use error::{Error, ErrorKind, Result};
pub use timestamp::DosDateTime;

// Re-export reading API at crate root for convenience
pub use read::{Archive, read_container};

// Re-export tree types at crate root for convenience
pub use tree::{Entry, EntryKind, FileTree, InsertOutcome};

// Re-export substitution API at crate root for convenience
pub use substitute::{PayloadSource, SubstitutionMap, SubstitutionResult};

// Re-export variant selection API at crate root for convenience
pub use variant::{RandomTieBreaker, TemplateDescriptor, TieBreaker, Variant, VariantSelector};

// Re-export writing API at crate root for convenience
pub use write::{WriteResult, serialize_container, write_container};

// Re-export assembly API at crate root for convenience
pub use assemble::{AssembleResult, assemble_container};
