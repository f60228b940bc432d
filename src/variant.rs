//! Template variant selection from free-text labels.
//!
//! A [`VariantSelector`] holds two disjoint category label sets and the
//! template descriptor each resolves to. Given a sequence of free-text
//! labels it normalizes them (trim, lowercase), discards anything
//! unrecognized, counts matches per category, and picks the majority
//! variant. Ties, including the no-recognized-labels case, are broken
//! uniformly at random.
//!
//! # Randomness
//!
//! The tie-break is the only randomness in this crate and it is injected
//! through the [`TieBreaker`] trait. The default, [`RandomTieBreaker`],
//! draws an independent choice from the thread RNG per call, so concurrent
//! requests share no seeded state. Closures implement the trait, letting
//! tests pin either branch:
//!
//! ```rust
//! use stagepack::{TemplateDescriptor, Variant, VariantSelector};
//!
//! # fn main() -> stagepack::Result<()> {
//! let selector = VariantSelector::new(
//!     ["hero", "knight"],
//!     TemplateDescriptor::new(Variant::A, "stage_a.usdz", "root.usdc"),
//!     ["villain", "rogue"],
//!     TemplateDescriptor::new(Variant::B, "stage_b.usdz", "root.usdc"),
//! )?;
//!
//! // Majority wins deterministically.
//! let descriptor = selector.select(["Hero", "knight", "rogue"]);
//! assert_eq!(descriptor.variant, Variant::A);
//!
//! // A tie falls to the injected tie-breaker.
//! let descriptor = selector.select_with(["hero", "rogue"], &mut || Variant::B);
//! assert_eq!(descriptor.variant, Variant::B);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::{Error, Result};

/// One of the two alternative template identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The first category's template.
    A,
    /// The second category's template.
    B,
}

/// The template a variant resolves to.
///
/// Resolved once per request by the selector and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Which variant this descriptor belongs to.
    pub variant: Variant,
    /// File name of the template container within the template directory.
    pub archive_filename: String,
    /// Name of the root scene-description entry the viewer requires first.
    pub stage_entry_name: String,
}

impl TemplateDescriptor {
    /// Creates a descriptor.
    pub fn new(
        variant: Variant,
        archive_filename: impl Into<String>,
        stage_entry_name: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            archive_filename: archive_filename.into(),
            stage_entry_name: stage_entry_name.into(),
        }
    }

    /// Returns the template container path inside `template_dir`.
    pub fn resolve_in(&self, template_dir: impl AsRef<Path>) -> PathBuf {
        template_dir.as_ref().join(&self.archive_filename)
    }
}

/// Source of the uniform choice used to break counting ties.
///
/// Implemented by [`RandomTieBreaker`] for production use and by any
/// `FnMut() -> Variant` closure for tests.
pub trait TieBreaker {
    /// Returns the variant to use for a tied classification.
    fn break_tie(&mut self) -> Variant;
}

impl<F: FnMut() -> Variant> TieBreaker for F {
    fn break_tie(&mut self) -> Variant {
        self()
    }
}

/// Tie-breaker drawing a fresh uniform choice from the thread RNG per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTieBreaker;

impl TieBreaker for RandomTieBreaker {
    fn break_tie(&mut self) -> Variant {
        if rand::thread_rng().gen_bool(0.5) {
            Variant::A
        } else {
            Variant::B
        }
    }
}

/// Classifies label sequences into one of two template variants.
///
/// Construct once at process start and share by reference; selection takes
/// `&self` and the label sets never change at runtime.
#[derive(Debug, Clone)]
pub struct VariantSelector {
    labels_a: HashSet<String>,
    labels_b: HashSet<String>,
    descriptor_a: TemplateDescriptor,
    descriptor_b: TemplateDescriptor,
}

impl VariantSelector {
    /// Creates a selector from two category label sets and their descriptors.
    ///
    /// Labels are normalized on the way in; empty labels are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if a descriptor is tagged with
    /// the wrong variant or the two normalized label sets overlap; either
    /// would make the classification ambiguous.
    pub fn new<I, J>(
        labels_a: I,
        descriptor_a: TemplateDescriptor,
        labels_b: J,
        descriptor_b: TemplateDescriptor,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        if descriptor_a.variant != Variant::A || descriptor_b.variant != Variant::B {
            return Err(Error::InvariantViolation(
                "descriptor variants do not match their category sets".into(),
            ));
        }

        let labels_a = normalize_set(labels_a);
        let labels_b = normalize_set(labels_b);
        if let Some(shared) = labels_a.intersection(&labels_b).next() {
            return Err(Error::InvariantViolation(format!(
                "label '{}' appears in both category sets",
                shared
            )));
        }

        Ok(Self {
            labels_a,
            labels_b,
            descriptor_a,
            descriptor_b,
        })
    }

    /// Returns the descriptor a variant maps to. The mapping is total.
    pub fn descriptor(&self, variant: Variant) -> &TemplateDescriptor {
        match variant {
            Variant::A => &self.descriptor_a,
            Variant::B => &self.descriptor_b,
        }
    }

    /// Classifies `labels` and resolves the winning template descriptor.
    ///
    /// Ties are broken by [`RandomTieBreaker`].
    pub fn select<I>(&self, labels: I) -> TemplateDescriptor
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.select_with(labels, &mut RandomTieBreaker)
    }

    /// Classifies `labels` with an explicit tie-breaker.
    pub fn select_with<I>(&self, labels: I, tie_breaker: &mut impl TieBreaker) -> TemplateDescriptor
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut count_a = 0usize;
        let mut count_b = 0usize;
        for label in labels {
            let normalized = normalize_label(label.as_ref());
            if normalized.is_empty() {
                continue;
            }
            if self.labels_a.contains(&normalized) {
                count_a += 1;
            } else if self.labels_b.contains(&normalized) {
                count_b += 1;
            }
        }

        let variant = match count_a.cmp(&count_b) {
            std::cmp::Ordering::Greater => Variant::A,
            std::cmp::Ordering::Less => Variant::B,
            std::cmp::Ordering::Equal => tie_breaker.break_tie(),
        };
        log::debug!(
            "variant selection: {} vs {} recognized labels, chose {:?}",
            count_a,
            count_b,
            variant
        );
        self.descriptor(variant).clone()
    }
}

/// Trims and lowercases a label.
fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

fn normalize_set<I>(labels: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    labels
        .into_iter()
        .map(|l| normalize_label(l.as_ref()))
        .filter(|l| !l.is_empty())
        .collect()
}
