//! End-to-end container assembly.
//!
//! [`assemble_container`] runs the whole transform pipeline for one request:
//! read the template container into a tree, apply the substitution map, and
//! serialize the result to the destination. All state is request-scoped; the
//! tree lives only for the duration of the call.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagepack::{assemble_container, SubstitutionMap, TemplateDescriptor, Variant};
//!
//! # fn main() -> stagepack::Result<()> {
//! let descriptor = TemplateDescriptor::new(Variant::A, "stage_a.usdz", "root.usdc");
//! let template = descriptor.resolve_in("/srv/templates");
//!
//! let mut substitutions = SubstitutionMap::new();
//! substitutions.insert_bytes("textures/poster.png", b"png bytes".to_vec())?;
//!
//! let result = assemble_container(&template, &substitutions, &descriptor, "out/stage.usdz")?;
//! println!("replaced {} entries", result.substitution.entries_replaced);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use crate::read::Archive;
use crate::substitute::{SubstitutionMap, SubstitutionResult};
use crate::variant::TemplateDescriptor;
use crate::write::{WriteResult, write_container};
use crate::Result;

/// Result of assembling one container.
#[must_use = "assemble result should be checked to verify what was produced"]
#[derive(Debug, Clone, Copy)]
pub struct AssembleResult {
    /// What the substitution pass changed.
    pub substitution: SubstitutionResult,
    /// What the writer produced.
    pub write: WriteResult,
}

/// Rebuilds the template at `template_path` with `substitutions` applied,
/// writing the finished container to `destination`.
///
/// The descriptor supplies the stage entry name the output must lead with.
/// On any failure the destination is left untouched.
pub fn assemble_container(
    template_path: impl AsRef<Path>,
    substitutions: &SubstitutionMap,
    descriptor: &TemplateDescriptor,
    destination: impl AsRef<Path>,
) -> Result<AssembleResult> {
    let template_path = template_path.as_ref();

    log::debug!("assembling from template '{}'", template_path.display());
    let mut tree = Archive::open_path(template_path)?.into_tree()?;

    let substitution = substitutions.apply(&mut tree)?;
    log::debug!(
        "substitution: {} replaced, {} created",
        substitution.entries_replaced,
        substitution.entries_created
    );

    let write = write_container(&tree, &descriptor.stage_entry_name, destination)?;
    Ok(AssembleResult { substitution, write })
}
